//! Typed product attributes: the schema side (`ProductAttribute`) and the
//! value side (`AttributeValue`).

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_core::{AttributeId, slugify};

static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_][0-9a-zA-Z_]*$").expect("valid regex"));

pub const INVALID_CODE: &str = "Code can only contain the letters a-z, A-Z, digits, \
     and underscores, and can't start with a digit";

/// Attribute value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    Text,
    Integer,
    Boolean,
    Float,
    Richtext,
    Date,
    Option,
    MultiOption,
    Entity,
    File,
    Image,
}

impl AttributeType {
    pub fn as_str(self) -> &'static str {
        match self {
            AttributeType::Text => "text",
            AttributeType::Integer => "integer",
            AttributeType::Boolean => "boolean",
            AttributeType::Float => "float",
            AttributeType::Richtext => "richtext",
            AttributeType::Date => "date",
            AttributeType::Option => "option",
            AttributeType::MultiOption => "multi_option",
            AttributeType::Entity => "entity",
            AttributeType::File => "file",
            AttributeType::Image => "image",
        }
    }

    pub fn is_option(self) -> bool {
        matches!(self, AttributeType::Option | AttributeType::MultiOption)
    }

    pub fn is_file(self) -> bool {
        matches!(self, AttributeType::File | AttributeType::Image)
    }
}

/// A reference to an arbitrary record (e.g. a partner) stored as an
/// attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: String,
    pub id: Uuid,
}

/// Named set of allowed values for option / multi-option attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeOptionGroup {
    pub name: String,
    pub options: Vec<String>,
}

impl AttributeOptionGroup {
    pub fn new<I, S>(name: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }
}

/// A stored attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Float(f64),
    Richtext(String),
    Date(NaiveDate),
    Option(String),
    MultiOption(Vec<String>),
    Entity(EntityRef),
    File(String),
    Image(String),
}

impl AttributeValue {
    /// Numeric reading of the value: integers, floats and numeric text.
    /// NaN and infinities are not numbers here.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            AttributeValue::Integer(v) => *v as f64,
            AttributeValue::Float(v) => *v,
            AttributeValue::Text(s) | AttributeValue::Richtext(s) => s.trim().parse().ok()?,
            _ => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Human-readable rendering used in attribute summaries.
    pub fn as_text(&self) -> String {
        match self {
            AttributeValue::Text(s)
            | AttributeValue::Richtext(s)
            | AttributeValue::Option(s)
            | AttributeValue::File(s)
            | AttributeValue::Image(s) => s.clone(),
            AttributeValue::Integer(v) => v.to_string(),
            AttributeValue::Boolean(v) => v.to_string(),
            AttributeValue::Float(v) => v.to_string(),
            AttributeValue::Date(d) => d.to_string(),
            AttributeValue::MultiOption(values) => values.join(", "),
            AttributeValue::Entity(e) => format!("{}:{}", e.kind, e.id),
        }
    }
}

/// Defines an attribute for a product class (e.g. `num_pages` for books).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAttribute {
    id: AttributeId,
    pub name: String,
    pub code: String,
    pub attribute_type: AttributeType,
    pub option_group: Option<AttributeOptionGroup>,
    pub required: bool,
}

impl ProductAttribute {
    /// New attribute; a blank code is derived from the name.
    pub fn new(name: impl Into<String>, code: impl Into<String>, attribute_type: AttributeType) -> Self {
        let name = name.into();
        let mut code = code.into();
        if code.trim().is_empty() {
            code = code_from_name(&name);
        }
        Self {
            id: AttributeId::new(),
            name,
            code,
            attribute_type,
            option_group: None,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_option_group(mut self, group: AttributeOptionGroup) -> Self {
        self.option_group = Some(group);
        self
    }

    /// Form field name used to bind this attribute.
    pub fn field_name(&self) -> String {
        format!("attr_{}", self.code)
    }

    /// Check a typed value against this attribute's type.
    pub fn validate_value(&self, value: &AttributeValue) -> Result<(), String> {
        match (self.attribute_type, value) {
            (AttributeType::Text | AttributeType::Richtext, AttributeValue::Text(_))
            | (AttributeType::Text | AttributeType::Richtext, AttributeValue::Richtext(_)) => Ok(()),
            (AttributeType::Text | AttributeType::Richtext, _) => Err("Must be str or unicode".into()),

            (AttributeType::Float, v) => v.as_f64().map(|_| ()).ok_or_else(|| "Must be a float".into()),

            (AttributeType::Integer, AttributeValue::Integer(_)) => Ok(()),
            (AttributeType::Integer, AttributeValue::Text(s)) if s.trim().parse::<i64>().is_ok() => Ok(()),
            (AttributeType::Integer, _) => Err("Must be an integer".into()),

            (AttributeType::Boolean, AttributeValue::Boolean(_)) => Ok(()),
            (AttributeType::Boolean, _) => Err("Must be a boolean".into()),

            (AttributeType::Date, AttributeValue::Date(_)) => Ok(()),
            (AttributeType::Date, _) => Err("Must be a date or datetime".into()),

            (AttributeType::Entity, AttributeValue::Entity(_)) => Ok(()),
            (AttributeType::Entity, _) => Err("Must be a model instance".into()),

            (AttributeType::Option, AttributeValue::Option(option)) => self.validate_option(option),
            (AttributeType::Option, _) => Err("Must be an attribute option".into()),

            (AttributeType::MultiOption, AttributeValue::MultiOption(options)) => {
                options.iter().try_for_each(|o| self.validate_option(o))
            }
            (AttributeType::MultiOption, _) => Err("Must be a list of attribute options".into()),

            (AttributeType::File | AttributeType::Image, AttributeValue::File(_))
            | (AttributeType::File | AttributeType::Image, AttributeValue::Image(_)) => Ok(()),
            (AttributeType::File | AttributeType::Image, _) => Err("Must be a file field".into()),
        }
    }

    fn validate_option(&self, option: &str) -> Result<(), String> {
        match &self.option_group {
            Some(group) if group.contains(option) => Ok(()),
            _ => Err(format!("{option} is not a valid choice for {}", self.name)),
        }
    }

    /// Parse a raw form value into a typed value.
    ///
    /// Blank input yields `Ok(None)` (the attribute is unset).
    pub fn parse_raw(&self, raw: &str) -> Result<Option<AttributeValue>, String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }

        let value = match self.attribute_type {
            AttributeType::Text => AttributeValue::Text(raw.to_string()),
            AttributeType::Richtext => AttributeValue::Richtext(raw.to_string()),
            AttributeType::Integer => AttributeValue::Integer(
                raw.parse().map_err(|_| "Must be an integer".to_string())?,
            ),
            AttributeType::Float => AttributeValue::Float(
                raw.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| "Must be a float".to_string())?,
            ),
            AttributeType::Boolean => AttributeValue::Boolean(parse_bool(raw)?),
            AttributeType::Date => AttributeValue::Date(
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| "Must be a date or datetime".to_string())?,
            ),
            AttributeType::Option => AttributeValue::Option(raw.to_string()),
            AttributeType::MultiOption => AttributeValue::MultiOption(
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            AttributeType::Entity => AttributeValue::Entity(parse_entity(raw)?),
            AttributeType::File => AttributeValue::File(raw.to_string()),
            AttributeType::Image => AttributeValue::Image(raw.to_string()),
        };

        self.validate_value(&value)?;
        Ok(Some(value))
    }
}

fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err("Must be a boolean".into()),
    }
}

fn parse_entity(raw: &str) -> Result<EntityRef, String> {
    let (kind, id) = raw
        .split_once(':')
        .ok_or_else(|| "Must be a model instance".to_string())?;
    let id = Uuid::parse_str(id.trim()).map_err(|_| "Must be a model instance".to_string())?;
    Ok(EntityRef {
        kind: kind.trim().to_string(),
        id,
    })
}

/// Whether `code` is a valid attribute code.
pub fn is_valid_code(code: &str) -> bool {
    CODE_RE.is_match(code)
}

/// Derive an attribute code from a display name ("Num pages" -> "num_pages").
pub fn code_from_name(name: &str) -> String {
    let code = slugify(name).replace('-', "_");
    match code.chars().next() {
        None => "attribute".to_string(),
        Some(c) if c.is_ascii_digit() => format!("_{code}"),
        Some(_) => code,
    }
}
