use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub const JSON_SCHEMA: &str = r##"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "title": "qtree Configuration",
  "description": "Field catalog and session settings for qtree",
  "type": "object",
  "properties": {
    "$schema": {
      "type": "string",
      "description": "JSON schema reference"
    },
    "fields": {
      "type": "array",
      "description": "Filterable fields, in presentation order",
      "items": {
        "$ref": "#/$defs/Field"
      },
      "default": []
    },
    "operators": {
      "type": "array",
      "description": "Operators added to the built-in catalog; an entry with a built-in id replaces it",
      "items": {
        "$ref": "#/$defs/Operator"
      },
      "default": []
    },
    "settings": {
      "$ref": "#/$defs/Settings",
      "description": "Session settings"
    }
  },
  "$defs": {
    "Field": {
      "type": "object",
      "description": "A field conditions can be built on",
      "required": ["name", "type", "operators"],
      "properties": {
        "name": {
          "type": "string",
          "minLength": 1,
          "description": "Unique field key, as sent on the wire"
        },
        "label": {
          "type": "string",
          "description": "Display name (defaults to name)"
        },
        "type": {
          "$ref": "#/$defs/FieldType"
        },
        "operators": {
          "type": "array",
          "description": "Operator ids valid for this field; the first one is used for new conditions",
          "items": { "type": "string" },
          "minItems": 1,
          "uniqueItems": true,
          "examples": [["eq", "neq", "in"], ["gt", "lt", "between"]]
        },
        "multivalue": {
          "type": "boolean",
          "default": false,
          "description": "Field holds several values per record"
        },
        "options": {
          "type": "array",
          "description": "Allowed values of an enum field",
          "items": {
            "$ref": "#/$defs/EnumOption"
          }
        }
      },
      "additionalProperties": false
    },
    "FieldType": {
      "type": "string",
      "enum": ["text", "number", "date", "boolean", "bool", "enum", "reference"],
      "description": "Declared value type; date values are ISO-8601 strings"
    },
    "EnumOption": {
      "type": "object",
      "required": ["value"],
      "properties": {
        "value": { "type": "string" },
        "label": { "type": "string" }
      },
      "additionalProperties": false
    },
    "Operator": {
      "type": "object",
      "description": "An operator and the shape of the values it takes",
      "required": ["id", "arity"],
      "properties": {
        "id": {
          "type": "string",
          "description": "Operator id, as sent on the wire"
        },
        "label": {
          "type": "string"
        },
        "arity": {
          "type": "integer",
          "minimum": 0,
          "maximum": 2,
          "description": "Number of values (scalar: 0 or 1, list: 1, range: 2)"
        },
        "shape": {
          "type": "string",
          "enum": ["scalar", "list", "range"],
          "default": "scalar",
          "description": "scalar: exactly arity values, list: one or more values, range: an ordered pair"
        }
      },
      "additionalProperties": false
    },
    "Settings": {
      "type": "object",
      "properties": {
        "history_limit": {
          "type": "integer",
          "minimum": 0,
          "default": 50,
          "description": "Undo steps kept per session"
        },
        "recent_events": {
          "type": "integer",
          "minimum": 0,
          "default": 100,
          "description": "Number of recent events kept for inspection"
        },
        "suggestion_distance": {
          "type": "integer",
          "minimum": 0,
          "default": 2,
          "description": "Maximum edit distance for 'did you mean' field suggestions"
        }
      },
      "additionalProperties": false
    }
  }
}"##;

/// writes the JSON schema to the specified path
pub fn write_schema_file(path: &Path) -> Result<()> {
    fs::write(path, JSON_SCHEMA)
        .with_context(|| format!("failed to write schema file: {}", path.display()))
}
