use std::collections::BTreeMap;

/// Flat description of a DOM element.
///
/// Only the tag name and the string attributes are modelled; this is what
/// schema parse rules read from and what `to_dom` serializers produce.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomElement {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
}

impl DomElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Merge a set of attributes, overwriting existing values
    pub fn with_attributes(mut self, attributes: BTreeMap<String, String>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_lookup() {
        let el = DomElement::new("p").with_attribute("data-id", "abc");
        assert_eq!(el.get_attribute("data-id"), Some("abc"));
        assert_eq!(el.get_attribute("class"), None);
    }
}
