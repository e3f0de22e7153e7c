//! Just enough XML-RPC to call TestLink: encoding a `methodCall` and decoding
//! the `methodResponse` it answers with.

use derive_more::{Display, Error};
use quick_xml::{escape::escape, events::Event, Reader};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    String(String),
    Double(f64),
    DateTime(String),
    Base64(String),
    Nil,
    Array(Vec<Value>),
    /// Members keep the order they were given or received in
    Struct(Vec<(String, Value)>),
}

impl Value {
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Struct(members) => members
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            Value::String(value) => value.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            Value::Int(value) => Some(*value != 0),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    fn encode(&self, out: &mut String) {
        out.push_str("<value>");
        match self {
            Value::Int(value) => {
                out.push_str("<int>");
                out.push_str(&value.to_string());
                out.push_str("</int>");
            }
            Value::Bool(value) => {
                out.push_str(if *value {
                    "<boolean>1</boolean>"
                } else {
                    "<boolean>0</boolean>"
                });
            }
            Value::String(value) => push_element(out, "string", value),
            Value::Double(value) => push_element(out, "double", &value.to_string()),
            Value::DateTime(value) => push_element(out, "dateTime.iso8601", value),
            Value::Base64(value) => push_element(out, "base64", value),
            Value::Nil => out.push_str("<nil/>"),
            Value::Array(items) => {
                out.push_str("<array><data>");
                for item in items {
                    item.encode(out);
                }
                out.push_str("</data></array>");
            }
            Value::Struct(members) => {
                out.push_str("<struct>");
                for (name, value) in members {
                    out.push_str("<member>");
                    push_element(out, "name", name);
                    value.encode(out);
                    out.push_str("</member>");
                }
                out.push_str("</struct>");
            }
        }
        out.push_str("</value>");
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(value) => write!(f, "{}", value),
            Value::Bool(value) => write!(f, "{}", value),
            Value::String(value) | Value::DateTime(value) | Value::Base64(value) => {
                write!(f, "'{}'", value)
            }
            Value::Double(value) => write!(f, "{}", value),
            Value::Nil => f.write_str("None"),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Struct(members) => {
                f.write_str("{")?;
                for (i, (name, value)) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "'{}': {}", name, value)?;
                }
                f.write_str("}")
            }
        }
    }
}

fn push_element(out: &mut String, tag: &str, text: &str) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    out.push_str(&escape(text));
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

/// Serializes a call of `method` with positional `params`.
pub fn method_call(method: &str, params: &[Value]) -> String {
    let mut out = String::from("<?xml version='1.0'?>\n<methodCall>\n");
    push_element(&mut out, "methodName", method);
    out.push_str("\n<params>\n");
    for param in params {
        out.push_str("<param>\n");
        param.encode(&mut out);
        out.push_str("\n</param>\n");
    }
    out.push_str("</params>\n</methodCall>\n");
    out
}

#[derive(Debug, Clone, PartialEq)]
pub enum MethodResponse {
    Success(Value),
    Fault { code: i64, message: String },
}

#[derive(Debug, Display, Error)]
pub enum XmlRpcError {
    #[display("invalid XML: {source}")]
    Xml { source: quick_xml::Error },
    #[display("malformed XML-RPC response: {reason}")]
    Malformed { reason: String },
}

fn malformed(reason: impl Into<String>) -> XmlRpcError {
    XmlRpcError::Malformed {
        reason: reason.into(),
    }
}

#[derive(Debug, Default)]
struct Element {
    name: String,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    fn expect_child(&self, name: &str) -> Result<&Element, XmlRpcError> {
        self.child(name)
            .ok_or_else(|| malformed(format!("<{}> without <{}>", self.name, name)))
    }
}

fn parse_document(xml: &str) -> Result<Element, XmlRpcError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|source| XmlRpcError::Xml { source })?;

        match event {
            Event::Start(start) => stack.push(Element {
                name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
                ..Default::default()
            }),
            Event::Empty(start) => {
                let element = Element {
                    name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
                    ..Default::default()
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => return Ok(element),
                }
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    let text = text
                        .unescape()
                        .map_err(|source| XmlRpcError::Xml { source })?;
                    current.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| malformed("unbalanced end tag"))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => return Ok(element),
                }
            }
            Event::Eof => return Err(malformed("unexpected end of document")),
            _ => {}
        }
    }
}

fn decode_value(value: &Element) -> Result<Value, XmlRpcError> {
    // A value without a type element is a string
    let Some(typed) = value.children.first() else {
        return Ok(Value::String(value.text.clone()));
    };
    let text = typed.text.trim();

    match typed.name.as_str() {
        "int" | "i4" | "i8" => text
            .parse()
            .map(Value::Int)
            .map_err(|_| malformed(format!("invalid integer `{}`", text))),
        "boolean" => match text {
            "1" => Ok(Value::Bool(true)),
            "0" => Ok(Value::Bool(false)),
            other => Err(malformed(format!("invalid boolean `{}`", other))),
        },
        "string" => Ok(Value::String(typed.text.clone())),
        "double" => text
            .parse()
            .map(Value::Double)
            .map_err(|_| malformed(format!("invalid double `{}`", text))),
        "dateTime.iso8601" => Ok(Value::DateTime(text.to_owned())),
        "base64" => Ok(Value::Base64(text.to_owned())),
        "nil" => Ok(Value::Nil),
        "array" => {
            let Some(data) = typed.child("data") else {
                return Ok(Value::Array(Vec::new()));
            };
            data.children
                .iter()
                .filter(|item| item.name == "value")
                .map(decode_value)
                .collect::<Result<_, _>>()
                .map(Value::Array)
        }
        "struct" => typed
            .children
            .iter()
            .filter(|member| member.name == "member")
            .map(|member| -> Result<(String, Value), XmlRpcError> {
                let name = member.expect_child("name")?.text.clone();
                let value = decode_value(member.expect_child("value")?)?;
                Ok((name, value))
            })
            .collect::<Result<_, _>>()
            .map(Value::Struct),
        other => Err(malformed(format!("unsupported value type <{}>", other))),
    }
}

/// Decodes a `methodResponse` document.
pub fn parse_response(xml: &str) -> Result<MethodResponse, XmlRpcError> {
    let root = parse_document(xml)?;
    if root.name != "methodResponse" {
        return Err(malformed(format!(
            "expected <methodResponse>, got <{}>",
            root.name
        )));
    }

    if let Some(fault) = root.child("fault") {
        let fault = decode_value(fault.expect_child("value")?)?;
        return Ok(MethodResponse::Fault {
            code: fault
                .get("faultCode")
                .and_then(Value::as_i64)
                .unwrap_or_default(),
            message: fault
                .get("faultString")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned(),
        });
    }

    let value = root
        .expect_child("params")?
        .expect_child("param")?
        .expect_child("value")?;
    decode_value(value).map(MethodResponse::Success)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_call() {
        let call = method_call(
            "tl.createRequirement",
            &[Value::Struct(vec![
                (String::from("devKey"), Value::String(String::from("abc"))),
                (String::from("type"), Value::Int(3)),
                (
                    String::from("scope"),
                    Value::String(String::from("<p>a & b</p>")),
                ),
                (String::from("overwrite"), Value::Bool(true)),
            ])],
        );

        assert_eq!(
            call,
            "<?xml version='1.0'?>\n<methodCall>\n<methodName>tl.createRequirement</methodName>\n\
            <params>\n<param>\n<value><struct>\
            <member><name>devKey</name><value><string>abc</string></value></member>\
            <member><name>type</name><value><int>3</int></value></member>\
            <member><name>scope</name><value><string>&lt;p&gt;a &amp; b&lt;/p&gt;</string></value></member>\
            <member><name>overwrite</name><value><boolean>1</boolean></value></member>\
            </struct></value>\n</param>\n</params>\n</methodCall>\n"
        );
    }

    #[test]
    fn test_success_response() {
        let xml = r#"<?xml version="1.0"?>
<methodResponse>
  <params>
    <param>
      <value>
        <array><data>
          <value><struct>
            <member><name>status_ok</name><value><boolean>1</boolean></value></member>
            <member><name>msg</name><value><string>ok</string></value></member>
            <member><name>id</name><value><int>318</int></value></member>
            <member><name>note</name><value>implicit &amp; string</value></member>
            <member><name>extra</name><value><nil/></value></member>
          </struct></value>
        </data></array>
      </value>
    </param>
  </params>
</methodResponse>"#;

        let MethodResponse::Success(value) = parse_response(xml).unwrap() else {
            panic!("expected a successful response");
        };
        let Value::Array(items) = &value else {
            panic!("expected an array, got {}", value);
        };
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].get("status_ok"), Some(&Value::Bool(true)));
        assert_eq!(items[0].get("id").and_then(Value::as_i64), Some(318));
        assert_eq!(
            items[0].get("note"),
            Some(&Value::String(String::from("implicit & string")))
        );
        assert_eq!(items[0].get("extra"), Some(&Value::Nil));
        assert_eq!(
            value.to_string(),
            "[{'status_ok': true, 'msg': 'ok', 'id': 318, 'note': 'implicit & string', 'extra': None}]"
        );
    }

    #[test]
    fn test_fault_response() {
        let xml = "<?xml version=\"1.0\"?><methodResponse><fault><value><struct>\
            <member><name>faultCode</name><value><int>-32601</int></value></member>\
            <member><name>faultString</name><value><string>server error. requested method tl.createRequirement does not exist.</string></value></member>\
            </struct></value></fault></methodResponse>";

        assert_eq!(
            parse_response(xml).unwrap(),
            MethodResponse::Fault {
                code: -32601,
                message: String::from(
                    "server error. requested method tl.createRequirement does not exist."
                ),
            }
        );
    }

    #[test]
    fn test_malformed_responses() {
        assert!(matches!(
            parse_response("<html><body>Not Found</body></html>"),
            Err(XmlRpcError::Malformed { .. })
        ));
        assert!(matches!(
            parse_response("<methodResponse><params></params></methodResponse>"),
            Err(XmlRpcError::Malformed { .. })
        ));
        assert!(parse_response(
            "<methodResponse><params><param><value><int>x</int></value></param></params></methodResponse>"
        )
        .is_err());
        assert!(parse_response("<methodResponse><params>").is_err());
    }
}
