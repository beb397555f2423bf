use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::error::{DjsonError, Result};
use crate::token::{Span, Token, TokenType};
use crate::tokenizer::DjsTokenizer;

pub(crate) type SharedTokenizer = Rc<RefCell<DjsTokenizer>>;

/// Any sequence of other tokens.
///
/// A stream is itself a token whose span expands as children are
/// discovered, and a lazily-evaluated sequence of those children. Tokens
/// are pulled from the producing tokenizer on demand; once the stream's
/// closer (or end of input, for an [`TokenType::Open`] stream) is reached,
/// the tokenizer link is cleared and the stream is fully materialized.
///
/// When the producing tokenizer containerizes, the children of a stream
/// include nested streams for each bracketed group:
///
/// ```text
///   (a[b]c)
/// ```
///
/// is represented as
///
/// ```text
///   PARENTHESES([
///    WORD('a')
///    BRACKETS([
///     WORD('b')
///    ])
///    WORD('c')
///   ])
/// ```
///
/// In [preserving mode](Self::preserve_output), every child ever produced
/// is retained and addressable; otherwise the stream retains only what an
/// active cursor's lookahead requires. A stream is owned by one logical
/// parser: behavior is defined for a single active cursor per stream.
#[derive(Clone)]
pub struct TokenStream {
    inner: Rc<RefCell<StreamInner>>,
}

struct StreamInner {
    span: Span,
    container: TokenType,
    source: Vec<Token>,
    pending: VecDeque<Token>,
    last_read: isize,
    preserving: bool,
    tokenizer: Option<SharedTokenizer>,
}

impl TokenStream {
    /// Constructs a fully-materialized stream from known tokens.
    pub fn from_tokens(span: Span, container: TokenType, tokens: Vec<Token>) -> Self {
        let last_read = tokens.len() as isize - 1;
        Self {
            inner: Rc::new(RefCell::new(StreamInner {
                span,
                container,
                source: tokens,
                pending: VecDeque::new(),
                last_read,
                preserving: true,
                tokenizer: None,
            })),
        }
    }

    /// Constructs the root stream over a live tokenizer.
    pub(crate) fn root(tokenizer: SharedTokenizer, container: TokenType) -> Self {
        let span = tokenizer.borrow().start_span();
        Self::lazy(tokenizer, span, container)
    }

    /// Constructs a child stream from the opening token of a container.
    pub(crate) fn child(tokenizer: SharedTokenizer, opener: &Token, container: TokenType) -> Self {
        let o = opener.span();
        let span = Span::new(o.start, o.end, o.line, o.last_line, o.offset);
        Self::lazy(tokenizer, span, container)
    }

    fn lazy(tokenizer: SharedTokenizer, span: Span, container: TokenType) -> Self {
        Self {
            inner: Rc::new(RefCell::new(StreamInner {
                span,
                container,
                source: Vec::new(),
                pending: VecDeque::new(),
                last_read: -1,
                preserving: false,
                tokenizer: Some(tokenizer),
            })),
        }
    }

    /// Configures the stream to retain its full token output, enabling
    /// [`view_tokens`](Self::view_tokens) and backward cursor movement.
    pub fn preserve_output(self) -> Self {
        self.set_preserving();
        self
    }

    pub(crate) fn set_preserving(&self) {
        self.inner.borrow_mut().preserving = true;
    }

    /// The current span of this stream. Expands while materializing.
    pub fn span(&self) -> Span {
        self.inner.borrow().span
    }

    /// The container type: `Open`, `Braces`, `Brackets`, or `Parentheses`.
    pub fn container_type(&self) -> TokenType {
        self.inner.borrow().container
    }

    /// Whether the stream is fully materialized (no live tokenizer).
    pub fn is_materialized(&self) -> bool {
        self.inner.borrow().tokenizer.is_none()
    }

    /// A snapshot of the retained children. Empty unless the stream is
    /// preserving or was constructed from known tokens.
    pub fn view_tokens(&self) -> Vec<Token> {
        self.inner.borrow().source.clone()
    }

    /// Creates a cursor over the children of this stream.
    pub fn cursor(&self) -> StreamCursor {
        let closer = self.container_type().closer();
        StreamCursor {
            stream: self.clone(),
            closer,
            previous: None,
            next_token: None,
            ready: true,
            element_index: -1,
        }
    }

    /// Drains the producing tokenizer to the end of this stream. Produced
    /// tokens remain addressable through the stream's pending queue.
    pub fn read_to_end(&self) -> Result<()> {
        if self.is_materialized() {
            return Ok(());
        }
        let mut cursor = self.cursor();
        let mut amount = 1;
        loop {
            if self.is_materialized() || cursor.peek(amount)?.is_none() {
                return Ok(());
            }
            amount += 1;
        }
    }

    /// Scans forward for an isolated or any occurrence of a symbol.
    ///
    /// With `exact`, matches adjacent to another symbol token are skipped,
    /// testing whether the match stands alone as an operator. The returned
    /// index is never less than `from_index`.
    pub fn lookup(&self, symbol: char, from_index: usize, exact: bool) -> Result<Option<Lookup>> {
        let mut cursor = self.cursor();
        let mut i = from_index;
        loop {
            let token = match cursor.peek(i as isize + 1)? {
                Some(t) => t,
                None => return Ok(None),
            };
            if token.is_symbol(symbol) {
                if exact
                    && (self.adjoins_symbol(&mut cursor, &token, i, -1)?
                        || self.adjoins_symbol(&mut cursor, &token, i, 1)?)
                {
                    i += 1;
                    continue;
                }
                return Ok(Some(Lookup { token, index: i }));
            }
            i += 1;
        }
    }

    /// Scans forward for a contiguous sequence of symbols, e.g. `"::"`.
    pub fn lookup_sequence(
        &self,
        symbol: &str,
        from_index: usize,
        exact: bool,
    ) -> Result<Option<Lookup>> {
        let mut chars = symbol.chars();
        let first_char = match chars.next() {
            Some(c) => c,
            None => return Ok(None),
        };
        let first = match self.lookup(first_char, from_index, false)? {
            Some(l) => l,
            None => return Ok(None),
        };
        let mut cursor = self.cursor();
        if exact && self.adjoins_symbol(&mut cursor, &first.token, first.index, -1)? {
            return self.lookup_sequence(symbol, from_index + 1, exact);
        }
        let mut previous = first.clone();
        for c in chars {
            let next = match self.lookup(c, previous.index + 1, false)? {
                Some(l) => l,
                None => return Ok(None),
            };
            if next.token.start() != previous.token.end() || next.index != previous.index + 1 {
                return self.lookup_sequence(symbol, first.index + 1, exact);
            }
            previous = next;
        }
        if exact && self.adjoins_symbol(&mut cursor, &previous.token, previous.index, 1)? {
            return self.lookup_sequence(symbol, previous.index + 1, exact);
        }
        Ok(Some(first))
    }

    fn adjoins_symbol(
        &self,
        cursor: &mut StreamCursor,
        token: &Token,
        index: usize,
        direction: isize,
    ) -> Result<bool> {
        let neighbor_offset = index as isize + 1 + direction;
        if neighbor_offset < 1 {
            return Ok(false);
        }
        let neighbor = match cursor.peek(neighbor_offset)? {
            Some(n) => n,
            None => return Ok(false),
        };
        if neighbor.token_type() != TokenType::Symbol {
            return Ok(false);
        }
        Ok(if direction < 0 {
            token.start() == neighbor.end()
        } else {
            neighbor.start() == token.end()
        })
    }

    /// Produces an indented textual rendering of the token tree, reading
    /// the stream to its end first. Use the `Display` implementation for a
    /// non-reading variant.
    pub fn stringify(&self) -> Result<String> {
        self.render(1, true)
    }

    fn render(&self, level: usize, allow_read: bool) -> Result<String> {
        let mut out = String::from("[");
        if allow_read {
            let mut cursor = self.cursor();
            let mut amount = 1;
            while let Some(token) = cursor.peek(amount)? {
                self.render_single(&mut out, &token, level, allow_read)?;
                amount += 1;
            }
        } else {
            let tokens = self.view_tokens();
            for token in &tokens {
                self.render_single(&mut out, token, level, allow_read)?;
            }
        }
        if !self.is_materialized() {
            write_render_line(&mut out, level);
            out.push_str("<reading...>");
        }
        write_render_line(&mut out, level.saturating_sub(1));
        out.push(']');
        Ok(out)
    }

    fn render_single(
        &self,
        out: &mut String,
        token: &Token,
        level: usize,
        allow_read: bool,
    ) -> Result<()> {
        write_render_line(out, level);
        out.push_str(&token.token_type().to_string());
        out.push('(');
        match token {
            Token::Number { value, .. } => out.push_str(&format!("{:?}", value)),
            Token::Stream(stream) => out.push_str(&stream.render(level + 1, allow_read)?),
            Token::Symbol { symbol, .. } => out.push_str(&format!("'{}'", symbol)),
            Token::Break { .. } => out.push_str("'\\n'"),
            _ => {
                if let Some(text) = token.parsed_text() {
                    out.push_str(&format!("'{}'", text.replace('\n', "\\n").replace('\t', "\\t")));
                }
            }
        }
        out.push(')');
        Ok(())
    }

    /// Releases the producing tokenizer and its reader. Idempotent; safe
    /// to call on a fully-materialized stream.
    pub fn close(&self) {
        let tokenizer = self.inner.borrow_mut().tokenizer.take();
        if let Some(tokenizer) = tokenizer {
            tokenizer.borrow_mut().close();
        }
    }

    fn expand_to_fit(&self, span: Span) {
        let mut inner = self.inner.borrow_mut();
        if span.end > inner.span.end {
            inner.span.end = span.end;
        }
        if span.last_line > inner.span.last_line {
            inner.span.last_line = span.last_line;
        }
    }
}

impl PartialEq for TokenStream {
    fn eq(&self, other: &Self) -> bool {
        if Rc::ptr_eq(&self.inner, &other.inner) {
            return true;
        }
        let a = self.inner.borrow();
        let b = other.inner.borrow();
        a.container == b.container && a.span == b.span && a.source == b.source
    }
}

impl fmt::Display for TokenStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(1, false).map_err(|_| fmt::Error)?)
    }
}

impl fmt::Debug for TokenStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("TokenStream")
            .field("container", &inner.container)
            .field("span", &inner.span)
            .field("children", &inner.source.len())
            .field("materialized", &inner.tokenizer.is_none())
            .finish()
    }
}

fn write_render_line(out: &mut String, level: usize) {
    out.push('\n');
    for _ in 0..level {
        out.push(' ');
    }
}

/// The result of a [`TokenStream::lookup`]: the matched token and its
/// child index within the stream.
#[derive(Debug, Clone)]
pub struct Lookup {
    pub token: Token,
    pub index: usize,
}

/// A cursor over the children of a [`TokenStream`].
///
/// Sequential [`next`](Self::next) returns successive children, `None`
/// once exhausted. [`peek`](Self::peek) looks ahead (or, in preserving
/// mode, arbitrarily far back) without advancing. Lookahead that has not
/// yet been consumed lives in the stream's shared pending queue, so
/// tokens discovered through one access path remain visible to the next.
pub struct StreamCursor {
    stream: TokenStream,
    closer: Option<char>,
    previous: Option<Token>,
    next_token: Option<Token>,
    ready: bool,
    element_index: isize,
}

impl StreamCursor {
    /// Whether another child is available, materializing one if needed.
    pub fn has_next(&mut self) -> Result<bool> {
        if self.ready {
            self.read_step()?;
            self.ready = false;
        }
        Ok(self.next_token.is_some())
    }

    /// Returns the next child, or `None` when the container is exhausted.
    pub fn next(&mut self) -> Result<Option<Token>> {
        if self.ready {
            self.read_step()?;
        }
        let current = self.next_token.clone();
        self.element_index += 1;
        self.ready = true;
        Ok(current)
    }

    fn read_step(&mut self) -> Result<()> {
        self.previous = self.next_token.take();
        let cached = {
            let inner = self.stream.inner.borrow();
            if let Some(front) = inner.pending.front() {
                Some(front.clone())
            } else {
                let idx = self.element_index + 1;
                if idx >= 0 && (idx as usize) < inner.source.len() {
                    Some(inner.source[idx as usize].clone())
                } else {
                    None
                }
            }
        };
        match cached {
            Some(token) => {
                let from_pending = !self.stream.inner.borrow().pending.is_empty();
                if from_pending {
                    self.stream.inner.borrow_mut().pending.pop_front();
                }
                self.next_token = Some(token);
            }
            None => self.next_token = self.resolve(1, false)?,
        }
        Ok(())
    }

    /// Moves the cursor forward (or, in preserving mode, backward) by the
    /// given number of children.
    pub fn skip(&mut self, amount: isize) -> Result<()> {
        for _ in 0..amount.max(0) {
            self.stream.inner.borrow_mut().pending.pop_front();
        }
        self.element_index += amount;
        self.resolve(0, false)?;
        self.ready = true;
        Ok(())
    }

    /// Moves the cursor so that the next child delivered has this index.
    pub fn skip_to(&mut self, index: isize) -> Result<()> {
        self.skip((index - 1) - self.element_index)
    }

    /// The index of the most recently delivered child.
    pub fn get_index(&self) -> isize {
        self.element_index
    }

    /// The stream this cursor traverses.
    pub fn parent(&self) -> &TokenStream {
        &self.stream
    }

    /// Returns the child `amount` positions ahead without advancing.
    /// `-1` returns the previous child; other negative offsets re-read
    /// from the retained list in preserving mode.
    pub fn peek(&mut self, amount: isize) -> Result<Option<Token>> {
        if let Some(cached) = self.get_cached(amount) {
            return Ok(Some(cached));
        }
        self.resolve(amount, true)
    }

    fn get_cached(&self, offset: isize) -> Option<Token> {
        if offset == -1 {
            return self.previous.clone();
        }
        let inner = self.stream.inner.borrow();
        if !inner.pending.is_empty() {
            if offset >= 1 {
                let pending_idx = (offset - 1) as usize;
                if pending_idx < inner.pending.len() {
                    return inner.pending.get(pending_idx).cloned();
                }
            }
        } else if !inner.source.is_empty() {
            let idx = self.element_index + offset;
            if idx >= 0 && (idx as usize) < inner.source.len() {
                return Some(inner.source[idx as usize].clone());
            }
        }
        None
    }

    fn resolve(&mut self, offset: isize, enqueue: bool) -> Result<Option<Token>> {
        let tokenizer = match self.stream.inner.borrow().tokenizer.clone() {
            Some(t) => t,
            None => return Ok(None),
        };
        let mut next = self.get_cached(offset - 1);
        while self.stream.inner.borrow().last_read < self.element_index + offset {
            // a nested container must drain the shared tokenizer before
            // the parent can continue past it
            if let Some(Token::Stream(child)) = &next {
                child.read_to_end()?;
                self.stream.expand_to_fit(child.span());
            }
            let produced = tokenizer.borrow_mut().next_token()?;
            let produced = produced.map(|t| containerize(&tokenizer, t));
            self.stream.inner.borrow_mut().last_read += 1;
            let token = match produced {
                Some(t) => t,
                None => {
                    if let Some(closer) = self.closer {
                        let (line, column) = tokenizer.borrow().position();
                        return Err(DjsonError::expected(
                            format_args!("'{}'", closer),
                            line,
                            column,
                        ));
                    }
                    tokenizer.borrow_mut().close();
                    self.stream.inner.borrow_mut().tokenizer = None;
                    return Ok(None);
                }
            };
            self.stream.expand_to_fit(token.span());
            if let Some(closer) = self.closer {
                if token.is_symbol(closer) {
                    self.stream.inner.borrow_mut().tokenizer = None;
                    return Ok(None);
                }
            }
            let mut inner = self.stream.inner.borrow_mut();
            if inner.preserving {
                if let Token::Stream(child) = &token {
                    child.set_preserving();
                }
                inner.source.push(token.clone());
            }
            if enqueue {
                inner.pending.push_back(token.clone());
            }
            drop(inner);
            next = Some(token);
        }
        Ok(next)
    }
}

fn containerize(tokenizer: &SharedTokenizer, token: Token) -> Token {
    if !tokenizer.borrow().is_containerized() {
        return token;
    }
    if let Token::Symbol { symbol, .. } = &token {
        if let Some(container) = TokenType::for_opener(*symbol) {
            return Token::Stream(TokenStream::child(Rc::clone(tokenizer), &token, container));
        }
    }
    token
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Span;
    use crate::tokenizer::DjsTokenizer;

    fn number(value: f64, start: usize, end: usize) -> Token {
        Token::Number { span: Span::on_line(start, end, 1, start), value, source: None }
    }

    #[test]
    fn next_lazily_evaluates_tokens() {
        let stream = DjsTokenizer::stream("1 2 3");
        let mut cursor = stream.cursor();
        assert!(stream.view_tokens().is_empty());

        assert_eq!(Some(number(1.0, 0, 1)), cursor.next().unwrap());
        assert!(stream.view_tokens().is_empty());
        assert_eq!(Some(number(2.0, 2, 3)), cursor.next().unwrap());
        assert_eq!(Some(number(3.0, 4, 5)), cursor.next().unwrap());
        assert_eq!(None, cursor.next().unwrap());
    }

    #[test]
    fn next_lazily_surfaces_syntax_errors() {
        let stream = DjsTokenizer::stream("1 'hello");
        let mut cursor = stream.cursor();
        assert_eq!(Some(number(1.0, 0, 1)), cursor.next().unwrap());
        assert!(cursor.next().is_err());
    }

    #[test]
    fn peek_does_not_advance_cursor() {
        let stream = DjsTokenizer::stream("1 2 3 4");
        let mut cursor = stream.cursor();
        assert_eq!(Some(number(1.0, 0, 1)), cursor.next().unwrap());

        assert_eq!(Some(number(2.0, 2, 3)), cursor.peek(1).unwrap());
        assert_eq!(Some(number(3.0, 4, 5)), cursor.peek(2).unwrap());
        assert_eq!(Some(number(4.0, 6, 7)), cursor.peek(3).unwrap());

        assert_eq!(Some(number(2.0, 2, 3)), cursor.next().unwrap());
        assert_eq!(Some(number(3.0, 4, 5)), cursor.next().unwrap());
        assert_eq!(Some(number(4.0, 6, 7)), cursor.next().unwrap());
    }

    #[test]
    fn peek_tolerates_reverse_order_when_preserving() {
        let stream = DjsTokenizer::stream("1 2 3").preserve_output();
        let mut cursor = stream.cursor();
        assert_eq!(Some(number(1.0, 0, 1)), cursor.next().unwrap());
        assert_eq!(Some(number(2.0, 2, 3)), cursor.next().unwrap());
        assert_eq!(Some(number(3.0, 4, 5)), cursor.next().unwrap());

        assert_eq!(Some(number(3.0, 4, 5)), cursor.peek(0).unwrap());
        assert_eq!(Some(number(2.0, 2, 3)), cursor.peek(-1).unwrap());
        assert_eq!(Some(number(1.0, 0, 1)), cursor.peek(-2).unwrap());
    }

    #[test]
    fn skip_advances_cursor() {
        let stream = DjsTokenizer::stream("1 2 3 4");
        let mut cursor = stream.cursor();
        assert_eq!(Some(number(1.0, 0, 1)), cursor.next().unwrap());
        cursor.skip(1).unwrap();
        assert_eq!(Some(number(3.0, 4, 5)), cursor.next().unwrap());
        assert_eq!(Some(number(4.0, 6, 7)), cursor.next().unwrap());
    }

    #[test]
    fn skip_to_advances_cursor() {
        let stream = DjsTokenizer::stream("1 2 3 4");
        let mut cursor = stream.cursor();
        assert_eq!(Some(number(1.0, 0, 1)), cursor.next().unwrap());
        cursor.skip_to(2).unwrap();
        assert_eq!(Some(number(3.0, 4, 5)), cursor.next().unwrap());
    }

    #[test]
    fn skip_tolerates_reverse_order_when_preserving() {
        let stream = DjsTokenizer::stream("1 2 3").preserve_output();
        let mut cursor = stream.cursor();
        assert_eq!(Some(number(1.0, 0, 1)), cursor.next().unwrap());
        assert_eq!(Some(number(2.0, 2, 3)), cursor.next().unwrap());
        cursor.skip(-2).unwrap();

        assert_eq!(Some(number(1.0, 0, 1)), cursor.next().unwrap());
        assert_eq!(Some(number(2.0, 2, 3)), cursor.next().unwrap());
        assert_eq!(Some(number(3.0, 4, 5)), cursor.next().unwrap());
    }

    #[test]
    fn preserving_retains_every_token_delivered() {
        let stream = DjsTokenizer::stream("1 2 3").preserve_output();
        let mut cursor = stream.cursor();
        let mut delivered = Vec::new();
        while let Some(token) = cursor.next().unwrap() {
            delivered.push(token);
        }
        assert_eq!(delivered, stream.view_tokens());
    }

    #[test]
    fn lookup_finds_symbols_at_or_after_from_index() {
        let stream = DjsTokenizer::stream("a : b : c").preserve_output();
        let first = stream.lookup(':', 0, false).unwrap().unwrap();
        assert_eq!(1, first.index);
        let second = stream.lookup(':', first.index + 1, false).unwrap().unwrap();
        assert_eq!(3, second.index);
        assert!(stream.lookup(':', second.index + 1, false).unwrap().is_none());
    }

    #[test]
    fn exact_lookup_skips_adjacent_symbols() {
        // the first '=' adjoins '<'; only the trailing one is isolated
        let stream = DjsTokenizer::stream("a <= b = c").preserve_output();
        let exact = stream.lookup('=', 0, true).unwrap().unwrap();
        assert_eq!(4, exact.index);
        let any = stream.lookup('=', 0, false).unwrap().unwrap();
        assert_eq!(2, any.index);
    }

    #[test]
    fn lookup_sequence_requires_contiguity() {
        let stream = DjsTokenizer::stream("a : : b :: c").preserve_output();
        let found = stream.lookup_sequence("::", 0, false).unwrap().unwrap();
        assert_eq!(4, found.index);
    }

    #[test]
    fn stringify_prints_token_types_and_text() {
        let stream = DjsTokenizer::stream("word");
        assert_eq!("[\n WORD('word')\n]", stream.stringify().unwrap());
    }

    #[test]
    fn stringify_escapes_newlines() {
        let stream = DjsTokenizer::stream("'''1\n2'''");
        assert_eq!("[\n STRING('1\\n2')\n]", stream.stringify().unwrap());
    }

    #[test]
    fn stringify_prints_all_tokens() {
        let stream = DjsTokenizer::stream("1 2 3");
        assert_eq!("[\n NUMBER(1.0)\n NUMBER(2.0)\n NUMBER(3.0)\n]", stream.stringify().unwrap());
    }

    #[test]
    fn stringify_recurses_into_containers() {
        let stream = DjsTokenizer::containerize("1 [ 2.25 2.5 2.75 ] 3");
        let expected = "[\n NUMBER(1.0)\n BRACKETS([\n  NUMBER(2.25)\n  NUMBER(2.5)\n  \
                        NUMBER(2.75)\n ])\n NUMBER(3.0)\n]";
        assert_eq!(expected, stream.stringify().unwrap());
    }

    #[test]
    fn display_does_not_read_to_end() {
        let stream = DjsTokenizer::stream("1 2 3");
        assert_eq!("[\n <reading...>\n]", stream.to_string());
    }

    #[test]
    fn container_without_closer_is_an_error() {
        let stream = DjsTokenizer::containerize("{[}");
        let err = stream.read_to_end().unwrap_err();
        assert!(err.to_string().contains("Expected ']'"), "{}", err);
    }

    #[test]
    fn container_span_expands_to_fit_children() {
        let stream = DjsTokenizer::containerize("{hello,world}");
        stream.read_to_end().unwrap();
        let mut cursor = stream.cursor();
        let child = cursor.next().unwrap().unwrap();
        match child {
            Token::Stream(braces) => {
                assert_eq!(TokenType::Braces, braces.container_type());
                let span = braces.span();
                assert_eq!((0, 13), (span.start, span.end));
            }
            other => panic!("expected a container, found {:?}", other),
        }
    }

    #[test]
    fn peek_materializes_only_what_is_needed() {
        let stream = DjsTokenizer::stream("1 2 3 4").preserve_output();
        let mut cursor = stream.cursor();
        cursor.peek(2).unwrap();
        assert_eq!(2, stream.view_tokens().len());
    }

    #[test]
    fn container_spans_contain_child_spans() {
        fn check(stream: &TokenStream) {
            let span = stream.span();
            for child in stream.view_tokens() {
                assert!(span.contains(&child.span()), "{:?} outside {:?}", child.span(), span);
                if let Token::Stream(nested) = &child {
                    check(nested);
                }
            }
        }
        let stream = DjsTokenizer::containerize("{a [b c] d}\n(e)").preserve_output();
        stream.read_to_end().unwrap();
        check(&stream);
    }

    #[test]
    fn nested_containers_materialize_recursively() {
        let stream = DjsTokenizer::containerize("{hello,[world]}");
        stream.read_to_end().unwrap();
        let mut cursor = stream.cursor();
        let braces = match cursor.next().unwrap().unwrap() {
            Token::Stream(s) => s,
            other => panic!("expected a container, found {:?}", other),
        };
        let mut inner = braces.cursor();
        assert!(matches!(inner.next().unwrap(), Some(Token::Word { .. })));
        assert!(matches!(inner.next().unwrap(), Some(Token::Symbol { symbol: ',', .. })));
        let brackets = match inner.next().unwrap().unwrap() {
            Token::Stream(s) => s,
            other => panic!("expected a container, found {:?}", other),
        };
        assert_eq!(TokenType::Brackets, brackets.container_type());
        let span = brackets.span();
        assert_eq!((7, 14), (span.start, span.end));
    }
}
