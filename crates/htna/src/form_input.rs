//! Form input mirroring
//!
//! A component configured with a [`FormInputType`] keeps an
//! `input.htna-form-input` child in its light tree, so an enclosing form sees
//! the element's `name`, `value` and (for checkboxes and radios) `checked`
//! attributes. Host attribute changes are pushed into the input; `change`
//! events on the input are written back to the host.

use htna_dom::{Dom, Event, NodeId};

use crate::types::parse_bool;
use crate::Result;

/// Class marking the mirrored input
pub const FORM_INPUT_CLASS: &str = "htna-form-input";

/// Attributes mirrored into the input of any kind
const MIRRORED: &[&str] = &["name", "value"];
const CHECKABLE: &[&str] = &["name", "value", "checked"];

/// Kind of input kept in sync with the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormInputType {
    /// Hidden input carrying `value`
    #[default]
    Text,
    Checkbox,
    Radio,
}

impl FormInputType {
    /// Value of the input's `type` attribute
    pub fn input_type(&self) -> &'static str {
        match self {
            Self::Text => "hidden",
            Self::Checkbox => "checkbox",
            Self::Radio => "radio",
        }
    }

    /// Whether the input tracks `checked` rather than `value`
    pub fn is_checkable(&self) -> bool {
        matches!(self, Self::Checkbox | Self::Radio)
    }

    /// Host attributes that have to be observed to keep the input current
    pub fn observed_attributes(&self) -> &'static [&'static str] {
        if self.is_checkable() { &["name", "value", "checked"] } else { &MIRRORED }
    }
}

/// Mirror between one host element and its form input
#[derive(Debug, Clone)]
pub(crate) struct FormInput {
    kind: FormInputType,
    dom: Dom,
    host: NodeId,
}

impl FormInput {
    pub(crate) fn new(kind: FormInputType, dom: Dom, host: NodeId) -> Self {
        Self { kind, dom, host }
    }

    /// Whether a change of `name` affects the input
    pub(crate) fn tracks(&self, name: &str) -> bool {
        self.kind.observed_attributes().contains(&name)
    }

    /// The input, created and appended to the host on first use
    pub(crate) fn input(&self) -> Result<NodeId> {
        let selector = format!("input.{FORM_INPUT_CLASS}");
        if let Some(input) = self.dom.query_selector(self.host, &selector)? {
            return Ok(input);
        }

        let owner = self.dom.tree().owner_document(self.host).unwrap_or_else(|| self.dom.document());
        let input = self.dom.create_element_in(owner, "input", None)?;
        self.dom.set_attribute(input, "type", self.kind.input_type())?;
        self.dom.set_attribute(input, "class", FORM_INPUT_CLASS)?;
        if self.kind.is_checkable() {
            self.dom.set_attribute(input, "style", "display: none")?;
        }

        let mirror = self.clone();
        self.dom.add_event_listener(input, "change", move |_: &mut Event| {
            if let Err(err) = mirror.write_back(input) {
                tracing::warn!("Form input change on {:?} not mirrored: {}", mirror.host, err);
            }
        });
        self.dom.append_child(self.host, input)?;
        tracing::debug!("Created {} form input {:?} for {:?}", self.kind.input_type(), input, self.host);
        Ok(input)
    }

    /// Push the host's attributes into the input
    pub(crate) fn sync(&self) -> Result<()> {
        let input = self.input()?;
        for &name in MIRRORED {
            match self.dom.get_attribute(self.host, name) {
                Some(value) => self.dom.set_attribute(input, name, &value)?,
                None => self.dom.remove_attribute(input, name)?,
            }
        }
        if self.kind.is_checkable() {
            let checked = self
                .dom
                .get_attribute(self.host, "checked")
                .is_some_and(|raw| parse_bool(&raw, "checked"));
            if checked {
                self.dom.set_attribute(input, "checked", "checked")?;
            } else {
                self.dom.remove_attribute(input, "checked")?;
            }
        }
        Ok(())
    }

    /// Copy the input's state back onto the host after a `change`
    fn write_back(&self, input: NodeId) -> Result<()> {
        if self.kind.is_checkable() {
            if self.dom.has_attribute(input, "checked") {
                self.dom.set_attribute(self.host, "checked", "checked")?;
            } else {
                self.dom.remove_attribute(self.host, "checked")?;
            }
            return Ok(());
        }

        let value = self.dom.get_attribute(input, "value").unwrap_or_default();
        if self.dom.get_attribute(self.host, "value").as_deref() != Some(value.as_str()) {
            self.dom.set_attribute(self.host, "value", &value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observed_attributes_per_kind() {
        assert_eq!(FormInputType::Text.observed_attributes(), ["name", "value"]);
        assert_eq!(FormInputType::Radio.observed_attributes(), ["name", "value", "checked"]);
        assert_eq!(FormInputType::default().input_type(), "hidden");
    }

    #[test]
    fn test_input_is_created_once() {
        let dom = Dom::new();
        let host = dom.create_element("x-field").unwrap();
        let mirror = FormInput::new(FormInputType::Checkbox, dom.clone(), host);

        let input = mirror.input().unwrap();
        assert_eq!(mirror.input().unwrap(), input);
        assert_eq!(dom.tree().parent(input), Some(host));
        assert_eq!(dom.get_attribute(input, "type").as_deref(), Some("checkbox"));
        assert_eq!(dom.get_attribute(input, "style").as_deref(), Some("display: none"));
    }

    #[test]
    fn test_sync_both_ways() {
        let dom = Dom::new();
        let host = dom.create_element("x-field").unwrap();
        dom.set_attribute(host, "name", "agree").unwrap();
        dom.set_attribute(host, "checked", "true").unwrap();
        let mirror = FormInput::new(FormInputType::Checkbox, dom.clone(), host);

        mirror.sync().unwrap();
        let input = mirror.input().unwrap();
        assert_eq!(dom.get_attribute(input, "name").as_deref(), Some("agree"));
        assert!(!dom.has_attribute(input, "value"));
        assert!(dom.has_attribute(input, "checked"));

        dom.remove_attribute(input, "checked").unwrap();
        dom.dispatch_event(input, &mut Event::new("change"));
        assert!(!dom.has_attribute(host, "checked"));
    }
}
