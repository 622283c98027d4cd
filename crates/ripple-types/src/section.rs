use serde::{Deserialize, Serialize};

/// One keyed partition of a sectioned sequence.
///
/// The section key plays the same role for sections as [`Entity::id`] does
/// for items: sections with equal keys are the same logical section.
///
/// [`Entity::id`]: crate::Entity::id
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section<S, T> {
    /// Stable section key.
    pub id: S,
    /// Items in display order. May be empty.
    pub items: Vec<T>,
}

impl<S, T> Section<S, T> {
    /// Create a section from its key and items.
    pub fn new(id: S, items: Vec<T>) -> Self {
        Self { id, items }
    }

    /// Create a section with no items.
    pub fn empty(id: S) -> Self {
        Self {
            id,
            items: Vec::new(),
        }
    }

    /// Number of items in this section.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the section has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// An ordered list of sections.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sections<S, T>(Vec<Section<S, T>>);

impl<S, T> Sections<S, T> {
    /// Create an empty sectioned sequence.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a section.
    pub fn push(&mut self, section: Section<S, T>) {
        self.0.push(section);
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no sections.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of items across all sections.
    pub fn item_count(&self) -> usize {
        self.0.iter().map(Section::len).sum()
    }

    /// The sections as a slice.
    pub fn as_slice(&self) -> &[Section<S, T>] {
        &self.0
    }

    /// Iterate over the sections.
    pub fn iter(&self) -> std::slice::Iter<'_, Section<S, T>> {
        self.0.iter()
    }

    /// Section at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Section<S, T>> {
        self.0.get(index)
    }

    /// Iterate over all items in display order, section by section.
    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.0.iter().flat_map(|s| s.items.iter())
    }

    /// Consume into the underlying vector of sections.
    pub fn into_inner(self) -> Vec<Section<S, T>> {
        self.0
    }
}

impl<S, T> Default for Sections<S, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, T> From<Vec<Section<S, T>>> for Sections<S, T> {
    fn from(sections: Vec<Section<S, T>>) -> Self {
        Self(sections)
    }
}

impl<S, T> FromIterator<Section<S, T>> for Sections<S, T> {
    fn from_iter<I: IntoIterator<Item = Section<S, T>>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<S, T> IntoIterator for Sections<S, T> {
    type Item = Section<S, T>;
    type IntoIter = std::vec::IntoIter<Section<S, T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, S, T> IntoIterator for &'a Sections<S, T> {
    type Item = &'a Section<S, T>;
    type IntoIter = std::slice::Iter<'a, Section<S, T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_count_spans_sections() {
        let sections: Sections<&str, u32> = vec![
            Section::new("a", vec![1, 2]),
            Section::empty("b"),
            Section::new("c", vec![3]),
        ]
        .into();
        assert_eq!(sections.len(), 3);
        assert_eq!(sections.item_count(), 3);
        assert_eq!(sections.items().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn default_is_empty() {
        let sections: Sections<String, u32> = Sections::default();
        assert!(sections.is_empty());
        assert_eq!(sections.item_count(), 0);
    }

    #[test]
    fn json_shape() {
        let sections: Sections<String, u32> =
            vec![Section::new("s".to_string(), vec![1])].into();
        let json = serde_json::to_string(&sections).unwrap();
        assert_eq!(json, r#"[{"id":"s","items":[1]}]"#);
    }
}
