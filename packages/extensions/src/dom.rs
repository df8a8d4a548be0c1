use plume_core::schema::ApplySchemaAttributes;
use plume_model::{DomElement, Mark, Node, ParseRule, ToDom};
use std::rc::Rc;

/// Parse rule reading the extra attributes from an element
pub(crate) fn parse_rule(tag: &str, extra: &ApplySchemaAttributes) -> ParseRule {
    let extra = extra.clone();
    ParseRule::tag(tag).with_attrs(Rc::new(move |element: &DomElement| Some(extra.parse(element))))
}

/// Serializer writing the extra attributes onto `tag`
pub(crate) fn node_to_dom(tag: &'static str, extra: &ApplySchemaAttributes) -> ToDom<Node> {
    let extra = extra.clone();
    Rc::new(move |node: &Node| DomElement::new(tag).with_attributes(extra.dom(&node.attrs)))
}

pub(crate) fn mark_to_dom(tag: &'static str, extra: &ApplySchemaAttributes) -> ToDom<Mark> {
    let extra = extra.clone();
    Rc::new(move |mark: &Mark| DomElement::new(tag).with_attributes(extra.dom(&mark.attrs)))
}
