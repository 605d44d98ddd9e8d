use roxmltree::{Node, NodeId};

use super::{
    error::{FormatError, LoadError, StructuralError},
    values::{actual_value, ActualValue},
};

/// Reader over a single element. Attributes are checked against the recognised set as soon as
/// the reader is created, before any child is mapped; [`StrictNode::finish`] then rejects every
/// child element and text node that was not handed out.
pub(crate) struct StrictNode<'a, 'input> {
    node: Node<'a, 'input>,
    attributes: &'static [&'static str],
    consumed_children: Vec<NodeId>,
    text_consumed: bool,
}

impl<'a, 'input: 'a> StrictNode<'a, 'input> {
    /// Fails on the first attribute not listed in `attributes`. Namespaced attributes are never
    /// recognised.
    pub(crate) fn new(
        node: Node<'a, 'input>,
        attributes: &'static [&'static str],
    ) -> Result<Self, StructuralError> {
        let unknown = node.attributes().find(|attr| {
            attr.namespace().is_some() || !attributes.iter().any(|name| *name == attr.name())
        });
        if let Some(attr) = unknown {
            return Err(StructuralError::UnknownAttribute {
                element: node.tag_name().name().to_string(),
                name: attr.name().to_string(),
                value: attr.value().to_string(),
                path: node_path(node),
            });
        }

        Ok(Self {
            node,
            attributes,
            consumed_children: Vec::new(),
            text_consumed: false,
        })
    }

    pub(crate) fn tag_name(&self) -> &'a str {
        self.node.tag_name().name()
    }

    /// Raw text of an unqualified attribute, if present.
    pub(crate) fn attribute(&self, name: &'static str) -> Option<&'a str> {
        debug_assert!(
            self.attributes.contains(&name),
            "attribute '{name}' is not declared for <{}>",
            self.tag_name()
        );
        self.node
            .attributes()
            .find(|attr| attr.namespace().is_none() && attr.name() == name)
            .map(|attr| attr.value())
    }

    /// Converted value of an optional attribute.
    pub(crate) fn attribute_value<T: ActualValue<'a>>(
        &self,
        name: &'static str,
    ) -> Result<Option<T>, FormatError> {
        self.attribute(name)
            .map(|value| actual_value(value, name))
            .transpose()
    }

    /// Text of a required attribute.
    pub(crate) fn required_attribute(
        &self,
        element: &'static str,
        name: &'static str,
    ) -> Result<&'a str, FormatError> {
        self.attribute(name)
            .ok_or(FormatError::MissingAttribute {
                element,
                attribute: name,
            })
    }

    /// All child elements named `tag`, in document order.
    pub(crate) fn elements(&mut self, tag: &'static str) -> Vec<Node<'a, 'input>> {
        let found: Vec<_> = self
            .node
            .children()
            .filter(|child| is_unqualified_element(child, tag))
            .collect();
        self.consumed_children
            .extend(found.iter().map(|child| child.id()));
        found
    }

    /// The child element named `tag`, which may appear at most once.
    pub(crate) fn element(
        &mut self,
        tag: &'static str,
    ) -> Result<Option<Node<'a, 'input>>, StructuralError> {
        let mut found = self.elements(tag).into_iter();
        let first = found.next();
        if found.next().is_some() {
            return Err(StructuralError::RepeatedElement {
                parent: self.tag_name().to_string(),
                name: tag,
            });
        }
        Ok(first)
    }

    /// Concatenated character data of the element.
    pub(crate) fn text(&mut self) -> String {
        self.text_consumed = true;
        self.node
            .children()
            .filter(|child| child.is_text())
            .filter_map(|child| child.text())
            .collect()
    }

    /// Fails on the first child element or text node that was not consumed.
    pub(crate) fn finish(self) -> Result<(), StructuralError> {
        for child in self.node.children() {
            if child.is_element() && !self.consumed_children.contains(&child.id()) {
                return Err(StructuralError::UnknownElement {
                    parent: self.tag_name().to_string(),
                    name: child.tag_name().name().to_string(),
                    path: node_path(self.node),
                });
            }
            if child.is_text() && !self.text_consumed {
                let text = child.text().unwrap_or_default();
                if !text.trim().is_empty() {
                    return Err(StructuralError::UnknownNode {
                        parent: self.tag_name().to_string(),
                        text: text.trim().to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Location of `node` for error messages, e.g. `Gti/Task 'Paint'/Parameter 'out'`.
fn node_path(node: Node) -> String {
    let mut steps: Vec<String> = node
        .ancestors()
        .filter(|ancestor| ancestor.is_element())
        .map(|element| {
            let tag = element.tag_name().name();
            let name = element
                .attributes()
                .find(|attr| attr.namespace().is_none() && attr.name() == "Name")
                .map(|attr| attr.value());
            match name {
                Some(name) => format!("{tag} '{name}'"),
                None => tag.to_string(),
            }
        })
        .collect();
    steps.reverse();
    steps.join("/")
}

fn is_unqualified_element(node: &Node, tag: &str) -> bool {
    node.is_element() && node.tag_name().namespace().is_none() && node.tag_name().name() == tag
}

/// Checks the attributes of `node`, runs `map` over a [`StrictNode`] for it and then checks that
/// no child was left over.
pub(crate) fn map_strict<'a, 'input: 'a, T>(
    node: Node<'a, 'input>,
    attributes: &'static [&'static str],
    map: impl FnOnce(&mut StrictNode<'a, 'input>) -> Result<T, LoadError>,
) -> Result<T, LoadError> {
    let mut strict = StrictNode::new(node, attributes)?;
    let value = map(&mut strict)?;
    strict.finish()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_root<T>(xml: &str, f: impl FnOnce(Node) -> T) -> T {
        let document = roxmltree::Document::parse(xml).unwrap();
        f(document.root_element())
    }

    #[test]
    fn consumed_content_passes() {
        with_root(
            r#"<Task Name="Paint"><Description>Paints</Description><Flag Name="x"/></Task>"#,
            |node| {
                let mut strict = StrictNode::new(node, &["Name"]).unwrap();
                assert_eq!(strict.attribute("Name"), Some("Paint"));
                let description = strict.element("Description").unwrap().unwrap();
                assert_eq!(StrictNode::new(description, &[]).unwrap().text(), "Paints");
                assert_eq!(strict.elements("Flag").len(), 1);
                strict.finish().unwrap();
            },
        );
    }

    #[test]
    fn declared_but_absent_attribute_is_none() {
        with_root(r#"<Flag/>"#, |node| {
            let strict = StrictNode::new(node, &["Name"]).unwrap();
            assert_eq!(strict.attribute("Name"), None);
            strict.finish().unwrap();
        });
    }

    #[test]
    fn unknown_attribute_is_rejected_on_creation() {
        with_root(r#"<Flag Name="x" Colour="red"/>"#, |node| {
            assert_eq!(
                StrictNode::new(node, &["Name"]).err(),
                Some(StructuralError::UnknownAttribute {
                    element: "Flag".into(),
                    name: "Colour".into(),
                    value: "red".into(),
                    path: "Flag 'x'".into(),
                })
            );
        });
    }

    #[test]
    fn unknown_attribute_is_reported_before_children_are_mapped() {
        with_root(r#"<Task Bogus="x"><Parameter Type="Folder"/></Task>"#, |node| {
            let mut mapped_children = false;
            let result = map_strict(node, &["Name"], |_| {
                mapped_children = true;
                Ok(())
            });
            assert!(!mapped_children);
            assert!(matches!(
                result,
                Err(LoadError::Structural(StructuralError::UnknownAttribute { ref name, .. }))
                    if name == "Bogus"
            ));
        });
    }

    #[test]
    fn unknown_element_is_named_with_its_location() {
        with_root(
            r#"<Gti><Enum Name="E"><Value Name="a"/><Item/></Enum></Gti>"#,
            |root| {
                let node = root.first_element_child().unwrap();
                let mut strict = StrictNode::new(node, &["Name"]).unwrap();
                strict.elements("Value");
                assert_eq!(
                    strict.finish(),
                    Err(StructuralError::UnknownElement {
                        parent: "Enum".into(),
                        name: "Item".into(),
                        path: "Gti/Enum 'E'".into(),
                    })
                );
            },
        );
    }

    #[test]
    fn stray_text_is_rejected_but_whitespace_and_comments_are_not() {
        with_root("<Gti>\n  <!-- nothing -->\n</Gti>", |node| {
            StrictNode::new(node, &[]).unwrap().finish().unwrap();
        });
        with_root("<Gti>hello</Gti>", |node| {
            assert!(matches!(
                StrictNode::new(node, &[]).unwrap().finish(),
                Err(StructuralError::UnknownNode { .. })
            ));
        });
    }

    #[test]
    fn namespaced_attribute_is_unknown() {
        with_root(
            r#"<Flag xmlns:x="urn:x" x:Name="a" Name="b"/>"#,
            |node| {
                assert!(matches!(
                    StrictNode::new(node, &["Name"]),
                    Err(StructuralError::UnknownAttribute { name, .. }) if name == "Name"
                ));
            },
        );
    }

    #[test]
    fn single_element_may_not_repeat() {
        with_root(
            "<Task><Description>a</Description><Description>b</Description></Task>",
            |node| {
                let mut strict = StrictNode::new(node, &["Name"]).unwrap();
                assert_eq!(
                    strict.element("Description"),
                    Err(StructuralError::RepeatedElement {
                        parent: "Task".into(),
                        name: "Description",
                    })
                );
            },
        );
    }

    #[test]
    fn missing_required_attribute() {
        with_root("<TaskImplementation/>", |node| {
            let strict = StrictNode::new(node, &["TaskName"]).unwrap();
            assert_eq!(
                strict.required_attribute("TaskImplementation", "TaskName"),
                Err(FormatError::MissingAttribute {
                    element: "TaskImplementation",
                    attribute: "TaskName",
                })
            );
        });
    }

    #[test]
    fn node_path_names_named_ancestors() {
        with_root(
            r#"<Gti><Task Name="Paint"><Parameter Type="File"/></Task></Gti>"#,
            |root| {
                let parameter = root
                    .descendants()
                    .find(|node| node.has_tag_name("Parameter"))
                    .unwrap();
                assert_eq!(node_path(parameter), "Gti/Task 'Paint'/Parameter");
            },
        );
    }
}
