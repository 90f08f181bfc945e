//! Minimal SOAP 1.1 envelope codec for the order management service.
//!
//! Only the document shape the order management system uses is supported:
//! one operation element inside `Body`, whose children are flat
//! `<name>value</name>` fields. Faults use the same shape with the
//! `faultcode` and `faultstring` children.

use std::str::FromStr;

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use thiserror::Error;

/// SOAP 1.1 envelope namespace.
pub const ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Target namespace of the order management service.
pub const CMS_NS: &str = "http://swiftlogistics.com/cms";

const FAULT: &str = "Fault";

/// Errors raised while reading an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SoapError {
    #[error("malformed XML: {0}")]
    Xml(String),

    #[error("envelope has no Body element")]
    MissingBody,

    #[error("Body element is empty")]
    EmptyBody,

    #[error("missing field '{0}'")]
    MissingField(String),

    #[error("field '{field}' has invalid value '{value}'")]
    InvalidField { field: String, value: String },
}

/// The operation element carried in a SOAP body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapMessage {
    operation: String,
    fields: Vec<(String, String)>,
}

impl SoapMessage {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            fields: Vec::new(),
        }
    }

    /// Builds a fault with the given code and message.
    pub fn fault(code: &str, message: impl std::fmt::Display) -> Self {
        Self::new(FAULT)
            .with_field("faultcode", code)
            .with_field("faultstring", message)
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl std::fmt::Display) -> Self {
        self.fields.push((name.into(), value.to_string()));
        self
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn is_fault(&self) -> bool {
        self.operation == FAULT
    }

    /// The `faultstring` of a fault message.
    pub fn fault_message(&self) -> Option<&str> {
        if !self.is_fault() {
            return None;
        }
        self.field("faultstring").ok()
    }

    /// Returns the first field with the given name.
    pub fn field(&self, name: &str) -> Result<&str, SoapError> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
            .ok_or_else(|| SoapError::MissingField(name.to_string()))
    }

    /// Returns a field parsed into `T`.
    pub fn parse_field<T: FromStr>(&self, name: &str) -> Result<T, SoapError> {
        let value = self.field(name)?;
        value.trim().parse().map_err(|_| SoapError::InvalidField {
            field: name.to_string(),
            value: value.to_string(),
        })
    }

    /// Renders the message as a complete SOAP envelope.
    pub fn to_xml(&self) -> String {
        // Faults live in the envelope namespace, operations in the service's.
        let prefix = if self.is_fault() { "soap" } else { "tns" };
        let mut xml = format!(
            r#"<?xml version="1.0" encoding="utf-8"?><soap:Envelope xmlns:soap="{ENVELOPE_NS}" xmlns:tns="{CMS_NS}"><soap:Body><{prefix}:{op}>"#,
            op = self.operation
        );
        for (name, value) in &self.fields {
            xml.push_str(&format!("<{name}>{}</{name}>", escape(value.as_str())));
        }
        xml.push_str(&format!(
            "</{prefix}:{op}></soap:Body></soap:Envelope>",
            op = self.operation
        ));
        xml
    }

    /// Reads the operation element out of a SOAP envelope.
    ///
    /// Namespace prefixes are ignored; elements are matched by local name.
    pub fn from_xml(xml: &str) -> Result<Self, SoapError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        // Depth below <Body>, None while outside it.
        let mut body_depth: Option<usize> = None;
        let mut saw_body = false;
        let mut operation: Option<String> = None;
        let mut current: Option<(String, String)> = None;
        let mut fields = Vec::new();

        loop {
            match reader.read_event().map_err(xml_error)? {
                Event::Start(e) => {
                    let name = local_name(e.local_name().as_ref());
                    match body_depth {
                        None => {
                            if name == "Body" {
                                saw_body = true;
                                body_depth = Some(0);
                            }
                        }
                        Some(depth) => {
                            match depth {
                                0 if operation.is_none() => operation = Some(name),
                                1 => current = Some((name, String::new())),
                                _ => {}
                            }
                            body_depth = Some(depth + 1);
                        }
                    }
                }
                Event::Empty(e) => {
                    let name = local_name(e.local_name().as_ref());
                    match body_depth {
                        None if name == "Body" => saw_body = true,
                        Some(0) if operation.is_none() => operation = Some(name),
                        Some(1) => fields.push((name, String::new())),
                        _ => {}
                    }
                }
                Event::Text(t) => {
                    if let Some((_, value)) = current.as_mut() {
                        value.push_str(&t.unescape().map_err(xml_error)?);
                    }
                }
                Event::CData(c) => {
                    if let Some((_, value)) = current.as_mut() {
                        value.push_str(&String::from_utf8_lossy(&c.into_inner()));
                    }
                }
                Event::End(_) => {
                    if let Some(depth) = body_depth {
                        if depth == 0 {
                            body_depth = None;
                        } else {
                            if depth == 2 {
                                if let Some(field) = current.take() {
                                    fields.push(field);
                                }
                            }
                            body_depth = Some(depth - 1);
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !saw_body {
            return Err(SoapError::MissingBody);
        }
        let operation = operation.ok_or(SoapError::EmptyBody)?;

        Ok(Self { operation, fields })
    }
}

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn xml_error(err: quick_xml::Error) -> SoapError {
    SoapError::Xml(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_request_envelope() {
        let xml = SoapMessage::new("createOrder")
            .with_field("clientId", 42)
            .with_field("orderDetails", "Mock Details")
            .to_xml();

        assert!(xml.contains(r#"xmlns:tns="http://swiftlogistics.com/cms""#));
        assert!(xml.contains(
            "<tns:createOrder><clientId>42</clientId><orderDetails>Mock Details</orderDetails></tns:createOrder>"
        ));
    }

    #[test]
    fn escapes_field_values() {
        let message = SoapMessage::new("createOrder").with_field("orderDetails", "a < b & \"c\"");
        let xml = message.to_xml();
        assert!(!xml.contains("a < b"));

        let parsed = SoapMessage::from_xml(&xml).unwrap();
        assert_eq!(parsed.field("orderDetails").unwrap(), "a < b & \"c\"");
    }

    #[test]
    fn parses_envelope_from_another_toolkit() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
            <SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/">
              <SOAP-ENV:Header/>
              <SOAP-ENV:Body>
                <ns1:createOrderResponse xmlns:ns1="http://swiftlogistics.com/cms">
                  <status>OrderCreated</status>
                  <orderId> 512 </orderId>
                  <note/>
                </ns1:createOrderResponse>
              </SOAP-ENV:Body>
            </SOAP-ENV:Envelope>"#;

        let message = SoapMessage::from_xml(xml).unwrap();
        assert_eq!(message.operation(), "createOrderResponse");
        assert_eq!(message.field("status").unwrap(), "OrderCreated");
        assert_eq!(message.parse_field::<i64>("orderId").unwrap(), 512);
        assert_eq!(message.field("note").unwrap(), "");
        assert!(!message.is_fault());
    }

    #[test]
    fn parses_fault() {
        let xml = SoapMessage::fault("soap:Client", "Invalid clientId").to_xml();
        assert!(xml.contains("<soap:Fault>"));

        let message = SoapMessage::from_xml(&xml).unwrap();
        assert!(message.is_fault());
        assert_eq!(message.fault_message(), Some("Invalid clientId"));
    }

    #[test]
    fn missing_body_is_an_error() {
        let xml = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"></soap:Envelope>"#;
        assert_eq!(SoapMessage::from_xml(xml), Err(SoapError::MissingBody));
    }

    #[test]
    fn empty_body_is_an_error() {
        let xml = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body></soap:Body></soap:Envelope>"#;
        assert_eq!(SoapMessage::from_xml(xml), Err(SoapError::EmptyBody));
    }

    #[test]
    fn malformed_xml_is_an_error() {
        let result = SoapMessage::from_xml("<soap:Envelope><soap:Body><op></wrong></soap:Body>");
        assert!(matches!(result, Err(SoapError::Xml(_))));
    }

    #[test]
    fn field_lookup_errors() {
        let message = SoapMessage::new("createOrderResponse").with_field("orderId", "abc");
        assert_eq!(
            message.field("status"),
            Err(SoapError::MissingField("status".to_string()))
        );
        assert!(matches!(
            message.parse_field::<i64>("orderId"),
            Err(SoapError::InvalidField { .. })
        ));
        assert_eq!(message.fault_message(), None);
    }
}
