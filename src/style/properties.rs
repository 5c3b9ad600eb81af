//! Key→value style configuration.
//!
//! Document producers that do not build a [`Style`] directly attach a
//! [`PropertyMap`] to each node instead. The map is folded onto the node's
//! style when the layout tree is built; a value of the wrong shape for its
//! key is rejected with [`LayoutError::InvalidProperty`].

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{Dimension, Style};
use crate::error::LayoutError;
use crate::geometry::Edges;

/// Recognized configuration keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Property {
    Width,
    Height,
    MinWidth,
    MaxWidth,
    MinHeight,
    MaxHeight,
    FlexGrow,
    FlexShrink,
    FlexBasis,
    FlexDirection,
    FlexWrap,
    JustifyContent,
    AlignItems,
    AlignSelf,
    AlignContent,
    RowGap,
    ColumnGap,
    GridRowStart,
    GridRowEnd,
    GridColumnStart,
    GridColumnEnd,
    GridAutoFlow,
    ColumnCount,
    RowCount,
    /// Uniform border width.
    Border,
    MarginTop,
    MarginRight,
    MarginBottom,
    MarginLeft,
    PaddingTop,
    PaddingRight,
    PaddingBottom,
    PaddingLeft,
    OverflowX,
    OverflowY,
    KeepTogether,
    RotationAngle,
    Float,
    Clear,
    TextAlign,
    Direction,
    FontFamily,
    FontSize,
    LineHeight,
}

impl Property {
    fn name(&self) -> String {
        serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| format!("{self:?}"))
    }
}

/// A configuration value. Lengths are `{"Pt": 10}` / `{"Percent": 50}` /
/// `"Auto"`; bare numbers are points where a length is expected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Number(f64),
    Length(Dimension),
    Keyword(String),
}

pub type PropertyMap = BTreeMap<Property, PropertyValue>;

impl Style {
    /// Apply every entry of `properties` on top of this style.
    pub fn apply_properties(&mut self, properties: &PropertyMap) -> Result<(), LayoutError> {
        for (property, value) in properties {
            self.set_property(*property, value)?;
        }
        Ok(())
    }

    /// Set a single key. Later keys overwrite earlier values.
    pub fn set_property(
        &mut self,
        property: Property,
        value: &PropertyValue,
    ) -> Result<(), LayoutError> {
        use Property as P;
        match property {
            P::Width => self.width = Some(length(property, value)?),
            P::Height => self.height = Some(length(property, value)?),
            P::MinWidth => self.min_width = Some(length(property, value)?),
            P::MaxWidth => self.max_width = Some(length(property, value)?),
            P::MinHeight => self.min_height = Some(length(property, value)?),
            P::MaxHeight => self.max_height = Some(length(property, value)?),
            P::FlexGrow => self.flex_grow = Some(non_negative(property, value)?),
            P::FlexShrink => self.flex_shrink = Some(non_negative(property, value)?),
            P::FlexBasis => self.flex_basis = Some(length(property, value)?),
            P::FlexDirection => self.flex_direction = Some(keyword(property, value)?),
            P::FlexWrap => self.flex_wrap = Some(keyword(property, value)?),
            P::JustifyContent => self.justify_content = Some(keyword(property, value)?),
            P::AlignItems => self.align_items = Some(keyword(property, value)?),
            P::AlignSelf => self.align_self = Some(keyword(property, value)?),
            P::AlignContent => self.align_content = Some(keyword(property, value)?),
            P::RowGap => self.row_gap = Some(non_negative(property, value)?),
            P::ColumnGap => self.column_gap = Some(non_negative(property, value)?),
            P::GridRowStart => self.grid_row_start = Some(integer(property, value)?),
            P::GridRowEnd => self.grid_row_end = Some(integer(property, value)?),
            P::GridColumnStart => self.grid_column_start = Some(integer(property, value)?),
            P::GridColumnEnd => self.grid_column_end = Some(integer(property, value)?),
            P::GridAutoFlow => self.grid_auto_flow = Some(keyword(property, value)?),
            P::ColumnCount => self.column_count = Some(count(property, value)?),
            P::RowCount => self.row_count = Some(count(property, value)?),
            P::Border => {
                self.border_width = Some(Edges::uniform(non_negative(property, value)?))
            }
            P::MarginTop => edge(&mut self.margin, property, value, |e, v| e.top = v)?,
            P::MarginRight => edge(&mut self.margin, property, value, |e, v| e.right = v)?,
            P::MarginBottom => edge(&mut self.margin, property, value, |e, v| e.bottom = v)?,
            P::MarginLeft => edge(&mut self.margin, property, value, |e, v| e.left = v)?,
            P::PaddingTop => edge(&mut self.padding, property, value, |e, v| e.top = v)?,
            P::PaddingRight => edge(&mut self.padding, property, value, |e, v| e.right = v)?,
            P::PaddingBottom => edge(&mut self.padding, property, value, |e, v| e.bottom = v)?,
            P::PaddingLeft => edge(&mut self.padding, property, value, |e, v| e.left = v)?,
            P::OverflowX => self.overflow_x = Some(keyword(property, value)?),
            P::OverflowY => self.overflow_y = Some(keyword(property, value)?),
            P::KeepTogether => match value {
                PropertyValue::Bool(b) => self.keep_together = Some(*b),
                other => return Err(invalid(property, format!("expected a boolean, got {other:?}"))),
            },
            P::RotationAngle => self.rotation_angle = Some(number(property, value)?),
            P::Float => self.float = Some(keyword(property, value)?),
            P::Clear => self.clear = Some(keyword(property, value)?),
            P::TextAlign => self.text_align = Some(keyword(property, value)?),
            P::Direction => self.direction = Some(keyword(property, value)?),
            P::FontFamily => match value {
                PropertyValue::Keyword(s) => self.font_family = Some(s.clone()),
                other => return Err(invalid(property, format!("expected a family name, got {other:?}"))),
            },
            P::FontSize => self.font_size = Some(non_negative(property, value)?),
            P::LineHeight => self.line_height = Some(non_negative(property, value)?),
        }
        Ok(())
    }
}

fn invalid(property: Property, reason: String) -> LayoutError {
    LayoutError::InvalidProperty {
        property: property.name(),
        reason,
    }
}

fn number(property: Property, value: &PropertyValue) -> Result<f64, LayoutError> {
    match value {
        PropertyValue::Number(n) if n.is_finite() => Ok(*n),
        PropertyValue::Length(Dimension::Pt(n)) if n.is_finite() => Ok(*n),
        other => Err(invalid(property, format!("expected a number, got {other:?}"))),
    }
}

fn non_negative(property: Property, value: &PropertyValue) -> Result<f64, LayoutError> {
    let n = number(property, value)?;
    if n < 0.0 {
        return Err(invalid(property, format!("{n} is negative")));
    }
    Ok(n)
}

fn integer(property: Property, value: &PropertyValue) -> Result<i32, LayoutError> {
    let n = number(property, value)?;
    if n.fract() != 0.0 || n.abs() > i32::MAX as f64 {
        return Err(invalid(property, format!("{n} is not an integer")));
    }
    Ok(n as i32)
}

fn count(property: Property, value: &PropertyValue) -> Result<u32, LayoutError> {
    let n = integer(property, value)?;
    if n < 1 {
        return Err(invalid(property, format!("{n} is not a positive count")));
    }
    Ok(n as u32)
}

fn length(property: Property, value: &PropertyValue) -> Result<Dimension, LayoutError> {
    match value {
        PropertyValue::Number(n) => Ok(Dimension::Pt(*n)),
        PropertyValue::Length(d) => Ok(*d),
        PropertyValue::Keyword(k) if k.eq_ignore_ascii_case("auto") => Ok(Dimension::Auto),
        PropertyValue::Keyword(k) => match k.strip_suffix('%').map(str::parse::<f64>) {
            Some(Ok(p)) => Ok(Dimension::Percent(p)),
            _ => Err(invalid(property, format!("`{k}` is not a length"))),
        },
        other => Err(invalid(property, format!("expected a length, got {other:?}"))),
    }
}

fn edge(
    target: &mut Option<Edges>,
    property: Property,
    value: &PropertyValue,
    set: impl FnOnce(&mut Edges, f64),
) -> Result<(), LayoutError> {
    let v = number(property, value)?;
    set(target.get_or_insert_with(Edges::default), v);
    Ok(())
}

/// Parse a keyword into one of the style enums. Both the variant name
/// (`SpaceBetween`) and the CSS spelling (`space-between`) are accepted.
fn keyword<T: DeserializeOwned>(property: Property, value: &PropertyValue) -> Result<T, LayoutError> {
    let PropertyValue::Keyword(k) = value else {
        return Err(invalid(property, format!("expected a keyword, got {value:?}")));
    };
    let from = |s: String| serde_json::from_value::<T>(serde_json::Value::String(s));
    from(k.clone())
        .or_else(|_| from(pascal_case(k)))
        .map_err(|_| invalid(property, format!("unknown keyword `{k}`")))
}

fn pascal_case(kebab: &str) -> String {
    kebab
        .split(['-', '_'])
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{JustifyContent, Overflow};

    #[test]
    fn property_map_deserializes_from_screaming_keys() {
        let json = r#"{
            "WIDTH": {"Percent": 50},
            "FLEX_GROW": 2,
            "JUSTIFY_CONTENT": "space-between",
            "KEEP_TOGETHER": true,
            "MARGIN_TOP": 4
        }"#;
        let map: PropertyMap = serde_json::from_str(json).unwrap();
        let mut style = Style::default();
        style.apply_properties(&map).unwrap();

        assert_eq!(style.width, Some(Dimension::Percent(50.0)));
        assert_eq!(style.flex_grow, Some(2.0));
        assert_eq!(style.justify_content, Some(JustifyContent::SpaceBetween));
        assert_eq!(style.keep_together, Some(true));
        assert_eq!(style.margin.map(|m| m.top), Some(4.0));
    }

    #[test]
    fn percent_keyword_is_a_length() {
        let mut style = Style::default();
        style
            .set_property(Property::MaxWidth, &PropertyValue::Keyword("25%".into()))
            .unwrap();
        assert_eq!(style.max_width, Some(Dimension::Percent(25.0)));
    }

    #[test]
    fn enum_variant_names_are_accepted() {
        let mut style = Style::default();
        style
            .set_property(Property::OverflowX, &PropertyValue::Keyword("Hidden".into()))
            .unwrap();
        assert_eq!(style.overflow_x, Some(Overflow::Hidden));
    }

    #[test]
    fn wrong_shape_is_rejected() {
        let mut style = Style::default();
        let err = style
            .set_property(Property::FlexGrow, &PropertyValue::Keyword("lots".into()))
            .unwrap_err();
        assert!(matches!(err, LayoutError::InvalidProperty { ref property, .. } if property == "FLEX_GROW"));

        let err = style
            .set_property(Property::ColumnCount, &PropertyValue::Number(0.0))
            .unwrap_err();
        assert!(matches!(err, LayoutError::InvalidProperty { .. }));
    }
}
