use crate::value::Value;

/// One entry of a DESCRIPTION listing: a callable procedure or topic.
#[derive(Debug, Clone, PartialEq)]
pub struct Capability {
    pub path: String,
    pub doc: Option<String>,
    /// Argument descriptors as sent by the device (usually `{name, ...}` maps).
    pub args: Vec<Value>,
    /// Return-value descriptors.
    pub ret: Vec<Value>,
}

impl Capability {
    /// Parse a description entry.
    ///
    /// Accepts either a record map with at least a `path` key, or a bare
    /// string naming the path. Anything else yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(path) => Some(Self {
                path: path.clone(),
                doc: None,
                args: Vec::new(),
                ret: Vec::new(),
            }),
            Value::Map(_) => {
                let path = value.get("path")?.as_str()?.to_string();
                let doc = value.get("doc").and_then(Value::as_str).map(str::to_string);
                let args = descriptor_list(value.get("args"));
                let ret = descriptor_list(value.get("ret"));
                Some(Self {
                    path,
                    doc,
                    args,
                    ret,
                })
            }
            _ => None,
        }
    }

    /// Names of the declared arguments, where the device supplied them.
    pub fn arg_names(&self) -> Vec<&str> {
        names(&self.args)
    }

    /// Names of the declared return values.
    pub fn ret_names(&self) -> Vec<&str> {
        names(&self.ret)
    }
}

/// Parse every recognizable entry of a DESCRIPTION list.
pub fn parse_capabilities(description: &[Value]) -> Vec<Capability> {
    description.iter().filter_map(Capability::from_value).collect()
}

fn descriptor_list(value: Option<&Value>) -> Vec<Value> {
    value
        .and_then(Value::as_list)
        .map(<[Value]>::to_vec)
        .unwrap_or_default()
}

fn names(descriptors: &[Value]) -> Vec<&str> {
    descriptors
        .iter()
        .filter_map(|d| d.get("name").and_then(Value::as_str).or_else(|| d.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    #[test]
    fn parses_full_record() {
        let value = record(serde_json::json!({
            "path": "mot1/go",
            "doc": "move motor 1",
            "args": [{"name": "pos"}, {"name": "vel"}, {"name": "acc"}],
            "ret": [{"name": "pos"}]
        }));
        let cap = Capability::from_value(&value).unwrap();
        assert_eq!(cap.path, "mot1/go");
        assert_eq!(cap.doc.as_deref(), Some("move motor 1"));
        assert_eq!(cap.arg_names(), vec!["pos", "vel", "acc"]);
        assert_eq!(cap.ret_names(), vec!["pos"]);
    }

    #[test]
    fn parses_bare_path() {
        let cap = Capability::from_value(&Value::Text("enable".into())).unwrap();
        assert_eq!(cap.path, "enable");
        assert!(cap.doc.is_none());
        assert!(cap.args.is_empty());
    }

    #[test]
    fn skips_unrecognized_entries() {
        let listing = vec![
            Value::Text("enable".into()),
            Value::Integer(3),
            record(serde_json::json!({"doc": "no path"})),
            record(serde_json::json!({"path": "adc/p"})),
        ];
        let caps = parse_capabilities(&listing);
        let paths: Vec<_> = caps.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["enable", "adc/p"]);
    }
}
