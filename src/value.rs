use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use crate::comments::{CommentData, CommentHolder, CommentType};
use crate::token::{CommentStyle, StringStyle};

/// Formatting metadata carried by every [`JsonValue`].
///
/// The line counts record newline characters consumed at each position
/// while parsing: `lines_above` between the previous sibling and this
/// value, `lines_between` between a key and its value, and
/// `lines_trailing` between the last child and the closing delimiter. A
/// value of `-1` means "auto": the writer applies its configured default.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub lines_above: i32,
    pub lines_between: i32,
    pub lines_trailing: i32,
    pub comments: CommentHolder,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            lines_above: -1,
            lines_between: -1,
            lines_trailing: -1,
            comments: CommentHolder::new(),
        }
    }
}

impl Metadata {
    /// Fills any unset fields of this metadata from `defaults`, leaving
    /// already-set fields untouched. Comment positions merge the same
    /// way: only absent positions are taken.
    pub fn apply_defaults(&mut self, defaults: &mut Metadata) {
        if self.lines_above < 0 {
            self.lines_above = defaults.lines_above;
        }
        if self.lines_between < 0 {
            self.lines_between = defaults.lines_between;
        }
        if self.lines_trailing < 0 {
            self.lines_trailing = defaults.lines_trailing;
        }
        for position in CommentType::ALL {
            if !self.comments.has(position) {
                if let Some(data) = defaults.comments.take(position) {
                    self.comments.set_data(position, data);
                }
            }
        }
    }
}

/// An ordered JSON object. Insertion order is preserved and duplicate
/// keys are representable; lookups return the first match.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JsonObject {
    members: Vec<(String, JsonValue)>,
}

impl JsonObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a member.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> &mut Self {
        self.members.push((key.into(), value.into()));
        self
    }

    /// Chaining variant of [`add`](Self::add) for building literals.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.add(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.members.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut JsonValue> {
        self.members.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_index(&self, index: usize) -> Option<&JsonValue> {
        self.members.get(index).map(|(_, v)| v)
    }

    pub fn first_mut(&mut self) -> Option<&mut JsonValue> {
        self.members.first_mut().map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        self.members.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn members(&self) -> &[(String, JsonValue)] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// An ordered JSON array.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JsonArray {
    elements: Vec<JsonValue>,
}

impl JsonArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: impl Into<JsonValue>) -> &mut Self {
        self.elements.push(value.into());
        self
    }

    pub fn with(mut self, value: impl Into<JsonValue>) -> Self {
        self.add(value);
        self
    }

    pub fn get(&self, index: usize) -> Option<&JsonValue> {
        self.elements.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &JsonValue> {
        self.elements.iter()
    }

    pub fn elements(&self) -> &[JsonValue] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// The structural variants of a JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonData {
    Null,
    Bool(bool),
    Number(f64),
    String { value: String, style: StringStyle },
    Array(JsonArray),
    Object(JsonObject),
}

/// A JSON value together with its formatting metadata.
///
/// Values compare equal under [`PartialEq`] only when both structure and
/// formatting agree; [`matches`](Self::matches) compares structure alone.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JsonValue {
    pub meta: Metadata,
    data: JsonData,
}

impl Default for JsonData {
    fn default() -> Self {
        JsonData::Null
    }
}

impl JsonValue {
    pub fn null() -> Self {
        JsonData::Null.into()
    }

    pub fn bool(value: bool) -> Self {
        JsonData::Bool(value).into()
    }

    pub fn number(value: f64) -> Self {
        JsonData::Number(value).into()
    }

    /// A string with no preserved style.
    pub fn string(value: impl Into<String>) -> Self {
        Self::styled_string(value, StringStyle::None)
    }

    pub fn styled_string(value: impl Into<String>, style: StringStyle) -> Self {
        JsonData::String { value: value.into(), style }.into()
    }

    pub fn data(&self) -> &JsonData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut JsonData {
        &mut self.data
    }

    pub fn is_null(&self) -> bool {
        matches!(self.data, JsonData::Null)
    }

    pub fn is_object(&self) -> bool {
        matches!(self.data, JsonData::Object(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.data, JsonData::Array(_))
    }

    pub fn is_container(&self) -> bool {
        self.is_object() || self.is_array()
    }

    pub fn is_primitive(&self) -> bool {
        !self.is_container()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.data {
            JsonData::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.data {
            JsonData::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.data {
            JsonData::String { value, .. } => Some(value),
            _ => None,
        }
    }

    /// The preserved string style, or [`StringStyle::None`] for
    /// non-string values.
    pub fn string_style(&self) -> StringStyle {
        match &self.data {
            JsonData::String { style, .. } => *style,
            _ => StringStyle::None,
        }
    }

    pub fn as_object(&self) -> Option<&JsonObject> {
        match &self.data {
            JsonData::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut JsonObject> {
        match &mut self.data {
            JsonData::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&JsonArray> {
        match &self.data {
            JsonData::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut JsonArray> {
        match &mut self.data {
            JsonData::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn lines_above(&self) -> i32 {
        self.meta.lines_above
    }

    pub fn lines_between(&self) -> i32 {
        self.meta.lines_between
    }

    pub fn lines_trailing(&self) -> i32 {
        self.meta.lines_trailing
    }

    pub fn set_lines_above(&mut self, lines: i32) -> &mut Self {
        self.meta.lines_above = lines;
        self
    }

    pub fn set_lines_between(&mut self, lines: i32) -> &mut Self {
        self.meta.lines_between = lines;
        self
    }

    pub fn set_lines_trailing(&mut self, lines: i32) -> &mut Self {
        self.meta.lines_trailing = lines;
        self
    }

    pub fn with_lines_above(mut self, lines: i32) -> Self {
        self.meta.lines_above = lines;
        self
    }

    pub fn comments(&self) -> &CommentHolder {
        &self.meta.comments
    }

    pub fn comments_mut(&mut self) -> &mut CommentHolder {
        &mut self.meta.comments
    }

    /// The rendered comment message at a position, or `""`.
    pub fn comment_text(&self, position: CommentType) -> String {
        self.meta.comments.text(position)
    }

    /// Attaches a single comment at a position, replacing existing data.
    pub fn set_comment(
        &mut self,
        position: CommentType,
        style: CommentStyle,
        text: impl Into<String>,
    ) -> &mut Self {
        self.meta.comments.set(position, style, text);
        self
    }

    pub fn set_comment_data(&mut self, position: CommentType, data: CommentData) -> &mut Self {
        self.meta.comments.set_data(position, data);
        self
    }

    /// Structural equivalence, ignoring formatting metadata and preserved
    /// string styles.
    pub fn matches(&self, other: &JsonValue) -> bool {
        match (&self.data, &other.data) {
            (JsonData::Null, JsonData::Null) => true,
            (JsonData::Bool(a), JsonData::Bool(b)) => a == b,
            (JsonData::Number(a), JsonData::Number(b)) => a == b,
            (JsonData::String { value: a, .. }, JsonData::String { value: b, .. }) => a == b,
            (JsonData::Array(a), JsonData::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.matches(y))
            }
            (JsonData::Object(a), JsonData::Object(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b.iter()).all(|((ka, va), (kb, vb))| ka == kb && va.matches(vb))
            }
            _ => false,
        }
    }
}

impl From<JsonData> for JsonValue {
    fn from(data: JsonData) -> Self {
        Self { meta: Metadata::default(), data }
    }
}

impl From<bool> for JsonValue {
    fn from(value: bool) -> Self {
        Self::bool(value)
    }
}

impl From<f64> for JsonValue {
    fn from(value: f64) -> Self {
        Self::number(value)
    }
}

impl From<i32> for JsonValue {
    fn from(value: i32) -> Self {
        Self::number(value as f64)
    }
}

impl From<&str> for JsonValue {
    fn from(value: &str) -> Self {
        Self::string(value)
    }
}

impl From<String> for JsonValue {
    fn from(value: String) -> Self {
        Self::string(value)
    }
}

impl From<JsonObject> for JsonValue {
    fn from(object: JsonObject) -> Self {
        JsonData::Object(object).into()
    }
}

impl From<JsonArray> for JsonValue {
    fn from(array: JsonArray) -> Self {
        JsonData::Array(array).into()
    }
}

/// A shared accessor to a [`JsonValue`].
///
/// References distinguish *accessing* operations, which imply the data is
/// required by the application and flag the referent as used, from
/// *visiting* operations, which merely inspect or reformat it. The flag
/// can be reflected on later to report unused values. Cloning a reference
/// shares the referent; [`copy`](Self::copy) duplicates it.
#[derive(Debug, Clone)]
pub struct JsonReference {
    referent: Rc<RefCell<JsonValue>>,
    accessed: Cell<bool>,
    mutable: Cell<bool>,
}

impl JsonReference {
    pub fn new(referent: JsonValue) -> Self {
        Self {
            referent: Rc::new(RefCell::new(referent)),
            accessed: Cell::new(false),
            mutable: Cell::new(true),
        }
    }

    /// Borrows the referent, flagging it as accessed.
    pub fn get(&self) -> Ref<'_, JsonValue> {
        self.accessed.set(true);
        self.get_only()
    }

    /// Borrows the referent without touching the access flag.
    pub fn get_only(&self) -> Ref<'_, JsonValue> {
        self.referent.borrow()
    }

    /// Replaces the referent, flagging it as accessed.
    ///
    /// # Panics
    ///
    /// Panics if the reference has been [frozen](Self::freeze).
    pub fn set(&self, referent: JsonValue) -> &Self {
        self.accessed.set(true);
        self.set_only(referent)
    }

    /// Visiting counterpart of [`set`](Self::set).
    ///
    /// # Panics
    ///
    /// Panics if the reference has been [frozen](Self::freeze).
    pub fn set_only(&self, referent: JsonValue) -> &Self {
        self.check_mutable();
        *self.referent.borrow_mut() = referent;
        self
    }

    /// Applies a transformation to the referent, flagging it as accessed.
    ///
    /// # Panics
    ///
    /// Panics if the reference has been [frozen](Self::freeze).
    pub fn apply(&self, updater: impl FnOnce(&mut JsonValue)) -> &Self {
        self.accessed.set(true);
        self.apply_only(updater)
    }

    /// Visiting counterpart of [`apply`](Self::apply).
    ///
    /// # Panics
    ///
    /// Panics if the reference has been [frozen](Self::freeze).
    pub fn apply_only(&self, updater: impl FnOnce(&mut JsonValue)) -> &Self {
        self.check_mutable();
        updater(&mut self.referent.borrow_mut());
        self
    }

    pub fn is_accessed(&self) -> bool {
        self.accessed.get()
    }

    pub fn set_accessed(&self, accessed: bool) -> &Self {
        self.accessed.set(accessed);
        self
    }

    pub fn is_mutable(&self) -> bool {
        self.mutable.get()
    }

    /// Freezes this reference into an immutable state. Permanent.
    pub fn freeze(&self) -> &Self {
        self.mutable.set(false);
        self
    }

    /// Creates a detached duplicate of this reference.
    pub fn copy(&self, track_access: bool) -> Self {
        let copy = Self::new(self.referent.borrow().clone());
        if track_access {
            copy.accessed.set(self.accessed.get());
        }
        copy
    }

    fn check_mutable(&self) {
        assert!(self.mutable.get(), "reference is immutable");
    }
}

impl PartialEq for JsonReference {
    fn eq(&self, other: &Self) -> bool {
        *self.referent.borrow() == *other.referent.borrow()
            && self.accessed == other.accessed
            && self.mutable == other.mutable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_ignores_formatting() {
        let mut a = JsonValue::number(1.0);
        a.set_lines_above(3);
        let b = JsonValue::number(1.0);
        assert!(a.matches(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn matches_ignores_string_style() {
        let a = JsonValue::styled_string("v", StringStyle::Single);
        let b = JsonValue::string("v");
        assert!(a.matches(&b));
    }

    #[test]
    fn objects_preserve_insertion_order() {
        let object = JsonObject::new().with("b", 2).with("a", 1);
        assert_eq!(vec!["b", "a"], object.keys().collect::<Vec<_>>());
    }

    #[test]
    fn apply_defaults_fills_only_unset_fields() {
        let mut meta = Metadata { lines_above: 2, ..Metadata::default() };
        let mut defaults = Metadata { lines_above: 0, lines_between: 1, ..Metadata::default() };
        meta.apply_defaults(&mut defaults);
        assert_eq!(2, meta.lines_above);
        assert_eq!(1, meta.lines_between);
    }

    #[test]
    fn references_track_access() {
        let reference = JsonReference::new(JsonValue::number(1.0));
        assert!(!reference.is_accessed());
        assert_eq!(Some(1.0), reference.get_only().as_f64());
        assert!(!reference.is_accessed());
        assert_eq!(Some(1.0), reference.get().as_f64());
        assert!(reference.is_accessed());
    }

    #[test]
    fn shared_references_synchronize_updates() {
        let a = JsonReference::new(JsonValue::number(1.0));
        let b = a.clone();
        a.set(JsonValue::number(7.0));
        assert_eq!(Some(7.0), b.get_only().as_f64());
    }

    #[test]
    #[should_panic(expected = "immutable")]
    fn frozen_references_reject_updates() {
        let reference = JsonReference::new(JsonValue::null());
        reference.freeze();
        reference.set(JsonValue::number(1.0));
    }

    #[test]
    fn apply_transforms_the_referent() {
        let reference = JsonReference::new(JsonValue::number(1.0));
        reference.apply(|v| *v = JsonValue::number(v.as_f64().unwrap_or(0.0) + 1.0));
        assert_eq!(Some(2.0), reference.get_only().as_f64());
    }
}
