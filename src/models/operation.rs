use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Where an operation parameter travels on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamLocation {
    Path,
    Query,
    Header,
}

impl ParamLocation {
    pub fn parse(location: &str) -> Option<Self> {
        match location {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            // cookie parameters are not forwarded
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationParam {
    pub name: String,
    pub location: ParamLocation,
    pub required: bool,
    pub schema: Value,
}

/// How the JSON request body is exposed as tool arguments
#[derive(Debug, Clone, PartialEq)]
pub enum BodyShape {
    /// Object body whose properties are individual tool arguments
    Flattened {
        properties: Vec<String>,
        required: bool,
        /// Argument names that differ from the upstream property name
        wire_names: BTreeMap<String, String>,
    },
    /// Any other body, passed whole as the `body` argument
    Whole { required: bool },
}

/// One invocable upstream operation, derived from a path + method pair
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub tool_name: String,
    pub method: reqwest::Method,
    pub path: String,
    pub description: Option<String>,
    pub params: Vec<OperationParam>,
    pub body: Option<BodyShape>,
    pub input_schema: Map<String, Value>,
}

impl BodyShape {
    /// Upstream property name for a flattened body argument
    pub fn wire_name<'a>(&'a self, argument: &'a str) -> &'a str {
        match self {
            Self::Flattened { wire_names, .. } => wire_names
                .get(argument)
                .map(String::as_str)
                .unwrap_or(argument),
            Self::Whole { .. } => argument,
        }
    }
}

impl Operation {
    pub fn param(&self, name: &str) -> Option<&OperationParam> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn params_in(&self, location: ParamLocation) -> impl Iterator<Item = &OperationParam> {
        self.params.iter().filter(move |p| p.location == location)
    }
}
