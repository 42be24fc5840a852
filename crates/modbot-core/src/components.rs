//! Interactive component builder
//!
//! Converts the portable button/dropdown descriptors of a manifest into
//! Discord message components.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{BotError, Result};
use crate::manifest::{ButtonDescriptor, DropdownDescriptor, MessageComponents};

const ACTION_ROW_TYPE: u8 = 1;
const BUTTON_TYPE: u8 = 2;
const STRING_SELECT_TYPE: u8 = 3;

/// Bounds applied while building components.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentLimits {
    /// Options kept from a dropdown descriptor.
    pub dropdown_option_cap: usize,
    /// Upper bound of a dropdown's `max_values`.
    pub dropdown_max_values: u32,
    /// Components allowed in one action row.
    pub row_capacity: usize,
}

impl Default for ComponentLimits {
    fn default() -> Self {
        Self {
            dropdown_option_cap: 24,
            dropdown_max_values: 25,
            row_capacity: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    Primary = 1,
    Secondary = 2,
    Success = 3,
    Danger = 4,
}

impl ButtonStyle {
    /// Map a descriptor style name; matching is case-insensitive.
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "primary" => Ok(Self::Primary),
            "secondary" => Ok(Self::Secondary),
            "success" => Ok(Self::Success),
            "danger" => Ok(Self::Danger),
            _ => Err(BotError::UnknownButtonStyle(name.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub custom_id: String,
    pub label: String,
    pub style: ButtonStyle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectMenu {
    pub custom_id: String,
    pub placeholder: String,
    pub min_values: u32,
    pub max_values: u32,
    pub options: Vec<SelectOption>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    Button(Button),
    SelectMenu(SelectMenu),
}

impl Component {
    pub fn custom_id(&self) -> &str {
        match self {
            Self::Button(button) => &button.custom_id,
            Self::SelectMenu(menu) => &menu.custom_id,
        }
    }

    /// Discord wire representation.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Button(button) => json!({
                "type": BUTTON_TYPE,
                "custom_id": button.custom_id,
                "label": button.label,
                "style": button.style as u8,
            }),
            Self::SelectMenu(menu) => json!({
                "type": STRING_SELECT_TYPE,
                "custom_id": menu.custom_id,
                "placeholder": menu.placeholder,
                "min_values": menu.min_values,
                "max_values": menu.max_values,
                "options": menu
                    .options
                    .iter()
                    .map(|option| json!({ "label": option.label, "value": option.value }))
                    .collect::<Vec<_>>(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActionRow {
    pub components: Vec<Component>,
}

impl ActionRow {
    pub fn to_json(&self) -> Value {
        json!({
            "type": ACTION_ROW_TYPE,
            "components": self.components.iter().map(Component::to_json).collect::<Vec<_>>(),
        })
    }
}

pub fn build_button(descriptor: &ButtonDescriptor) -> Result<Button> {
    Ok(Button {
        custom_id: descriptor.id.clone(),
        label: descriptor.label.clone(),
        style: ButtonStyle::parse(&descriptor.style)?,
    })
}

pub fn build_dropdown(descriptor: &DropdownDescriptor, limits: &ComponentLimits) -> SelectMenu {
    let options: Vec<SelectOption> = descriptor
        .options
        .iter()
        .take(limits.dropdown_option_cap)
        .map(|value| SelectOption {
            label: value.clone(),
            value: value.clone(),
        })
        .collect();

    // max is derived from the full option list, before truncation
    let max_values = u32::try_from(descriptor.max)
        .unwrap_or_else(|_| u32::try_from(descriptor.options.len()).unwrap_or(u32::MAX))
        .min(limits.dropdown_max_values);

    SelectMenu {
        custom_id: format!("{}-{}", descriptor.id, descriptor.flag),
        placeholder: descriptor.placeholder.clone(),
        min_values: descriptor.min,
        max_values,
        options,
    }
}

/// Build the single action row of a message: dropdowns first, then buttons.
///
/// Returns `None` when the message declares no components.
pub fn build_row(
    components: Option<&MessageComponents>,
    limits: &ComponentLimits,
) -> Result<Option<ActionRow>> {
    let Some(components) = components else {
        return Ok(None);
    };

    let mut row = ActionRow::default();
    for dropdown in components.dropdowns.iter().flatten() {
        row.components
            .push(Component::SelectMenu(build_dropdown(dropdown, limits)));
    }
    for button in components.buttons.iter().flatten() {
        row.components.push(Component::Button(build_button(button)?));
    }

    if row.components.is_empty() {
        return Ok(None);
    }
    if row.components.len() > limits.row_capacity {
        return Err(BotError::Validation(format!(
            "{} components do not fit in one row (max {})",
            row.components.len(),
            limits.row_capacity
        )));
    }
    Ok(Some(row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn dropdown(max: i32, option_count: usize) -> DropdownDescriptor {
        DropdownDescriptor {
            id: "year".into(),
            flag: "bc".into(),
            placeholder: "Pick a year".into(),
            min: 1,
            max,
            options: (0..option_count).map(|i| format!("opt{i}")).collect(),
        }
    }

    fn button(style: &str) -> ButtonDescriptor {
        ButtonDescriptor {
            id: "bntDepartment".into(),
            label: "Department".into(),
            style: style.into(),
        }
    }

    #[test]
    fn test_build_button_maps_style() {
        let built = build_button(&button("Danger")).unwrap();
        assert_eq!(built.custom_id, "bntDepartment");
        assert_eq!(built.label, "Department");
        assert_eq!(built.style, ButtonStyle::Danger);
        assert_eq!(build_button(&button("secondary")).unwrap().style, ButtonStyle::Secondary);
    }

    #[test]
    fn test_build_button_rejects_unknown_style() {
        let err = build_button(&button("Sparkly")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(matches!(err, BotError::UnknownButtonStyle(style) if style == "Sparkly"));
    }

    #[test]
    fn test_build_dropdown_defaults_max_to_option_count() {
        let menu = build_dropdown(&dropdown(-1, 5), &ComponentLimits::default());
        assert_eq!(menu.custom_id, "year-bc");
        assert_eq!(menu.min_values, 1);
        assert_eq!(menu.max_values, 5);
        assert_eq!(menu.options.len(), 5);
        assert_eq!(menu.options[2].label, "opt2");
        assert_eq!(menu.options[2].value, "opt2");
    }

    #[test]
    fn test_build_dropdown_truncates_and_clamps() {
        let menu = build_dropdown(&dropdown(-1, 30), &ComponentLimits::default());
        assert_eq!(menu.options.len(), 24);
        assert_eq!(menu.max_values, 25);

        let menu = build_dropdown(&dropdown(40, 3), &ComponentLimits::default());
        assert_eq!(menu.max_values, 25);
    }

    #[test]
    fn test_build_dropdown_respects_explicit_max() {
        let menu = build_dropdown(&dropdown(2, 10), &ComponentLimits::default());
        assert_eq!(menu.max_values, 2);
        let menu = build_dropdown(&dropdown(0, 10), &ComponentLimits::default());
        assert_eq!(menu.max_values, 0);
    }

    #[test]
    fn test_build_dropdown_custom_option_cap() {
        let limits = ComponentLimits {
            dropdown_option_cap: 25,
            ..ComponentLimits::default()
        };
        let menu = build_dropdown(&dropdown(-1, 30), &limits);
        assert_eq!(menu.options.len(), 25);
    }

    #[test]
    fn test_build_row_orders_dropdowns_before_buttons() {
        let components = MessageComponents {
            buttons: Some(vec![button("Primary")]),
            dropdowns: Some(vec![dropdown(-1, 2)]),
        };
        let row = build_row(Some(&components), &ComponentLimits::default())
            .unwrap()
            .unwrap();
        let ids: Vec<&str> = row.components.iter().map(Component::custom_id).collect();
        assert_eq!(ids, vec!["year-bc", "bntDepartment"]);
    }

    #[test]
    fn test_build_row_omits_empty() {
        let limits = ComponentLimits::default();
        assert!(build_row(None, &limits).unwrap().is_none());
        let empty = MessageComponents {
            buttons: Some(vec![]),
            dropdowns: None,
        };
        assert!(build_row(Some(&empty), &limits).unwrap().is_none());
    }

    #[test]
    fn test_build_row_rejects_overflow() {
        let components = MessageComponents {
            buttons: Some((0..6).map(|_| button("Primary")).collect()),
            dropdowns: None,
        };
        let err = build_row(Some(&components), &ComponentLimits::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_action_row_wire_format() {
        let row = ActionRow {
            components: vec![
                Component::SelectMenu(build_dropdown(&dropdown(-1, 1), &ComponentLimits::default())),
                Component::Button(build_button(&button("Success")).unwrap()),
            ],
        };
        let value = row.to_json();
        assert_eq!(value["type"], 1);
        assert_eq!(value["components"][0]["type"], 3);
        assert_eq!(value["components"][0]["options"][0]["value"], "opt0");
        assert_eq!(value["components"][1]["type"], 2);
        assert_eq!(value["components"][1]["style"], 3);
    }
}
