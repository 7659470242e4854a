//! XML-RPC transport for the send panel plus the small codec it needs.
//!
//! Only the subset used here is supported: scalar values, structs and
//! arrays, one call per HTTP request, faults as `faultCode`/`faultString`.

use crate::domain::model::{Outcome, Payload};
use crate::domain::ports::RemoteClient;
use crate::utils::error::{Result, TriadError};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::{Map, Value};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:7777/RPC2";
pub const DEFAULT_METHOD: &str = "receive";
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;
const RPC_PATH: &str = "/RPC2";

#[derive(Debug, Clone)]
pub struct XmlRpcOptions {
    pub endpoint: String,
    pub method: String,
    pub connect_timeout: Duration,
    pub reply_timeout: Duration,
}

impl Default for XmlRpcOptions {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            method: DEFAULT_METHOD.to_string(),
            connect_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            reply_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

/// Blocking XML-RPC client calling `method(payload_struct)`.
///
/// Must be constructed outside of an async context; the call itself runs on
/// whatever executor the send presenter was given.
#[derive(Debug, Clone)]
pub struct XmlRpcClient {
    endpoint: String,
    method: String,
    client: reqwest::blocking::Client,
}

impl XmlRpcClient {
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_options(XmlRpcOptions {
            endpoint: endpoint.to_string(),
            ..XmlRpcOptions::default()
        })
    }

    pub fn with_options(options: XmlRpcOptions) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(options.connect_timeout)
            .timeout(options.reply_timeout)
            .build()?;

        Ok(Self {
            endpoint: normalize_endpoint(&options.endpoint),
            method: options.method,
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn method(&self) -> &str {
        &self.method
    }
}

impl RemoteClient for XmlRpcClient {
    fn send(&self, payload: &Payload) -> Result<Outcome> {
        let params = Value::Object(payload.to_map().into_iter().collect::<Map<_, _>>());
        let body = encode_method_call(&self.method, &[params])?;

        tracing::debug!("POST {} method={}", self.endpoint, self.method);
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "text/xml")
            .body(body)
            .send()?;

        let status = response.status();
        tracing::debug!("XML-RPC response status: {}", status);
        if !status.is_success() {
            return Err(TriadError::HttpStatusError {
                status: status.as_u16(),
            });
        }

        let text = response.text()?;
        match parse_response(&text)? {
            MethodResponse::Value(value) => Ok(Outcome::Success(value_as_message(&value))),
            MethodResponse::Fault { code, message } => {
                tracing::debug!("XML-RPC fault {}: {}", code, message);
                Ok(Outcome::Failure(Some(message)))
            }
        }
    }
}

/// Appends `/RPC2` unless the endpoint already ends with it.
pub fn normalize_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.ends_with(RPC_PATH) {
        trimmed.to_string()
    } else {
        format!("{}{}", trimmed, RPC_PATH)
    }
}

fn value_as_message(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub method: String,
    pub params: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MethodResponse {
    Value(Value),
    Fault { code: i64, message: String },
}

pub fn encode_method_call(method: &str, params: &[Value]) -> Result<String> {
    let mut writer = document()?;
    open(&mut writer, "methodCall")?;
    leaf(&mut writer, "methodName", method)?;
    open(&mut writer, "params")?;
    for param in params {
        open(&mut writer, "param")?;
        encode_value(&mut writer, param)?;
        close(&mut writer, "param")?;
    }
    close(&mut writer, "params")?;
    close(&mut writer, "methodCall")?;
    finish(writer)
}

pub fn encode_response(value: &Value) -> Result<String> {
    let mut writer = document()?;
    open(&mut writer, "methodResponse")?;
    open(&mut writer, "params")?;
    open(&mut writer, "param")?;
    encode_value(&mut writer, value)?;
    close(&mut writer, "param")?;
    close(&mut writer, "params")?;
    close(&mut writer, "methodResponse")?;
    finish(writer)
}

pub fn encode_fault(code: i64, message: &str) -> Result<String> {
    let mut fault = Map::new();
    fault.insert("faultCode".to_string(), Value::from(code));
    fault.insert("faultString".to_string(), Value::from(message));

    let mut writer = document()?;
    open(&mut writer, "methodResponse")?;
    open(&mut writer, "fault")?;
    encode_value(&mut writer, &Value::Object(fault))?;
    close(&mut writer, "fault")?;
    close(&mut writer, "methodResponse")?;
    finish(writer)
}

type XmlWriter = Writer<Vec<u8>>;

fn document() -> Result<XmlWriter> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", None, None)))
        .map_err(write_error)?;
    Ok(writer)
}

fn finish(writer: XmlWriter) -> Result<String> {
    String::from_utf8(writer.into_inner()).map_err(write_error)
}

fn open(writer: &mut XmlWriter, name: &str) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(write_error)
}

fn close(writer: &mut XmlWriter, name: &str) -> Result<()> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(write_error)
}

fn leaf(writer: &mut XmlWriter, name: &str, text: &str) -> Result<()> {
    open(writer, name)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(write_error)?;
    close(writer, name)
}

fn write_error(e: impl std::fmt::Display) -> TriadError {
    TriadError::protocol(format!("failed to write XML: {}", e))
}

fn encode_value(writer: &mut XmlWriter, value: &Value) -> Result<()> {
    open(writer, "value")?;
    match value {
        Value::Null => leaf(writer, "string", "")?,
        Value::Bool(b) => leaf(writer, "boolean", if *b { "1" } else { "0" })?,
        Value::Number(n) => match n.as_i64().and_then(|v| i32::try_from(v).ok()) {
            Some(v) => leaf(writer, "int", &v.to_string())?,
            // <int> 只有 32 位元，其餘數字以 double 傳送
            None => leaf(writer, "double", &n.as_f64().unwrap_or(0.0).to_string())?,
        },
        Value::String(s) => leaf(writer, "string", s)?,
        Value::Array(items) => {
            open(writer, "array")?;
            open(writer, "data")?;
            for item in items {
                encode_value(writer, item)?;
            }
            close(writer, "data")?;
            close(writer, "array")?;
        }
        Value::Object(members) => {
            open(writer, "struct")?;
            for (name, member) in members {
                open(writer, "member")?;
                leaf(writer, "name", name)?;
                encode_value(writer, member)?;
                close(writer, "member")?;
            }
            close(writer, "struct")?;
        }
    }
    close(writer, "value")
}

pub fn parse_method_call(xml: &str) -> Result<MethodCall> {
    let mut parser = Parser::new(xml)?;
    parser.expect_open("methodCall")?;
    parser.expect_open("methodName")?;
    let method = parser.text_until_close("methodName")?;

    let mut params = Vec::new();
    if parser.peek_open("params") {
        parser.advance();
        while parser.peek_open("param") {
            parser.advance();
            params.push(parser.parse_value()?);
            parser.expect_close("param")?;
        }
        parser.expect_close("params")?;
    }
    parser.expect_close("methodCall")?;

    Ok(MethodCall { method, params })
}

pub fn parse_response(xml: &str) -> Result<MethodResponse> {
    let mut parser = Parser::new(xml)?;
    parser.expect_open("methodResponse")?;

    if parser.peek_open("fault") {
        parser.advance();
        let fault = parser.parse_value()?;
        parser.expect_close("fault")?;
        let code = fault.get("faultCode").and_then(Value::as_i64).unwrap_or(0);
        let message = fault
            .get("faultString")
            .and_then(Value::as_str)
            .unwrap_or("unknown fault")
            .to_string();
        return Ok(MethodResponse::Fault { code, message });
    }

    parser.expect_open("params")?;
    parser.expect_open("param")?;
    let value = parser.parse_value()?;
    parser.expect_close("param")?;
    parser.expect_close("params")?;
    parser.expect_close("methodResponse")?;
    Ok(MethodResponse::Value(value))
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open(String),
    Close(String),
    Text(String),
}

/// Flattens the document into element and text tokens.
///
/// Entities and character references are resolved, CDATA is folded into the
/// surrounding text and `<x/>` is reported as an open/close pair.
fn tokenize(xml: &str) -> Result<Vec<Token>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().expand_empty_elements = true;

    let mut tokens = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => tokens.push(Token::Open(element_name(e.name().as_ref()))),
            Event::End(e) => tokens.push(Token::Close(element_name(e.name().as_ref()))),
            Event::Text(e) => push_text(&mut tokens, &e.unescape()?),
            Event::CData(e) => push_text(&mut tokens, &String::from_utf8_lossy(&e.into_inner())),
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(tokens)
}

fn element_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn push_text(tokens: &mut Vec<Token>, text: &str) {
    if text.is_empty() {
        return;
    }
    match tokens.last_mut() {
        Some(Token::Text(previous)) => previous.push_str(text),
        _ => tokens.push(Token::Text(text.to_string())),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(xml: &str) -> Result<Self> {
        Ok(Self {
            tokens: tokenize(xml)?,
            pos: 0,
        })
    }

    // 標籤之間的空白只是排版
    fn skip_blank(&mut self) {
        while matches!(self.tokens.get(self.pos), Some(Token::Text(t)) if t.trim().is_empty()) {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<&Token> {
        self.skip_blank();
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        self.skip_blank();
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn peek_open(&mut self, name: &str) -> bool {
        matches!(self.peek(), Some(Token::Open(n)) if n == name)
    }

    fn peek_close(&mut self, name: &str) -> bool {
        matches!(self.peek(), Some(Token::Close(n)) if n == name)
    }

    fn expect_open(&mut self, name: &str) -> Result<()> {
        match self.advance() {
            Some(Token::Open(n)) if n == name => Ok(()),
            other => Err(unexpected(&format!("<{}>", name), other)),
        }
    }

    fn expect_close(&mut self, name: &str) -> Result<()> {
        match self.advance() {
            Some(Token::Close(n)) if n == name => Ok(()),
            other => Err(unexpected(&format!("</{}>", name), other)),
        }
    }

    /// Reads optional text, whitespace included, followed by the closing tag.
    fn text_until_close(&mut self, name: &str) -> Result<String> {
        let text = match self.tokens.get(self.pos) {
            Some(Token::Text(t)) => {
                let t = t.clone();
                self.pos += 1;
                t
            }
            _ => String::new(),
        };
        self.expect_close(name)?;
        Ok(text)
    }

    fn parse_value(&mut self) -> Result<Value> {
        self.expect_open("value")?;

        // 沒有型別標籤的值視為字串
        if let Some(Token::Close(n)) = self.tokens.get(self.pos) {
            if n == "value" {
                self.pos += 1;
                return Ok(Value::String(String::new()));
            }
        }
        if let (Some(Token::Text(t)), Some(Token::Close(n))) =
            (self.tokens.get(self.pos), self.tokens.get(self.pos + 1))
        {
            if n == "value" {
                let text = t.clone();
                self.pos += 2;
                return Ok(Value::String(text));
            }
        }

        let value = match self.advance() {
            Some(Token::Open(kind)) => match kind.as_str() {
                "nil" => {
                    self.expect_close("nil")?;
                    Value::Null
                }
                "int" | "i4" | "i8" => {
                    let text = self.text_until_close(&kind)?;
                    let v = text.trim().parse::<i64>().map_err(|_| {
                        TriadError::protocol(format!("invalid integer {:?}", text))
                    })?;
                    Value::from(v)
                }
                "boolean" => {
                    let text = self.text_until_close(&kind)?;
                    match text.trim() {
                        "1" => Value::Bool(true),
                        "0" => Value::Bool(false),
                        other => {
                            return Err(TriadError::protocol(format!("invalid boolean {:?}", other)))
                        }
                    }
                }
                "double" => {
                    let text = self.text_until_close(&kind)?;
                    let v = text.trim().parse::<f64>().map_err(|_| {
                        TriadError::protocol(format!("invalid double {:?}", text))
                    })?;
                    Value::from(v)
                }
                "string" | "dateTime.iso8601" | "base64" => {
                    Value::String(self.text_until_close(&kind)?)
                }
                "struct" => self.parse_struct()?,
                "array" => self.parse_array()?,
                other => return Err(TriadError::protocol(format!("unsupported type <{}>", other))),
            },
            other => return Err(unexpected("a value", other)),
        };

        self.expect_close("value")?;
        Ok(value)
    }

    fn parse_struct(&mut self) -> Result<Value> {
        let mut members = Map::new();
        while self.peek_open("member") {
            self.advance();
            self.expect_open("name")?;
            let name = self.text_until_close("name")?;
            let value = self.parse_value()?;
            self.expect_close("member")?;
            members.insert(name, value);
        }
        self.expect_close("struct")?;
        Ok(Value::Object(members))
    }

    fn parse_array(&mut self) -> Result<Value> {
        let mut items = Vec::new();
        self.expect_open("data")?;
        while !self.peek_close("data") {
            items.push(self.parse_value()?);
        }
        self.expect_close("data")?;
        self.expect_close("array")?;
        Ok(Value::Array(items))
    }
}

fn unexpected(expected: &str, found: Option<Token>) -> TriadError {
    let found = match found {
        Some(Token::Open(n)) => format!("<{}>", n),
        Some(Token::Close(n)) => format!("</{}>", n),
        Some(Token::Text(t)) => format!("text {:?}", t.trim()),
        None => "end of document".to_string(),
    };
    TriadError::protocol(format!("expected {}, found {}", expected, found))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(
            normalize_endpoint("http://127.0.0.1:7777"),
            "http://127.0.0.1:7777/RPC2"
        );
        assert_eq!(
            normalize_endpoint("http://127.0.0.1:7777/"),
            "http://127.0.0.1:7777/RPC2"
        );
        assert_eq!(
            normalize_endpoint("http://127.0.0.1:7777/RPC2"),
            "http://127.0.0.1:7777/RPC2"
        );
    }

    #[test]
    fn test_method_call_carries_payload_struct() {
        let payload = Payload::new("alice", 42);
        let params = Value::Object(payload.to_map().into_iter().collect());
        let xml = encode_method_call("receive", &[params]).unwrap();

        assert!(xml.contains("<methodName>receive</methodName>"));
        assert!(xml.contains("<member><name>amount</name><value><int>42</int></value></member>"));
        assert!(xml.contains(
            "<member><name>currency</name><value><string>USD</string></value></member>"
        ));

        let call = parse_method_call(&xml).unwrap();
        assert_eq!(call.method, "receive");
        assert_eq!(
            call.params,
            vec![json!({"identifier": "alice", "amount": 42, "currency": "USD"})]
        );
    }

    #[test]
    fn test_escaping_survives_parse() {
        let xml = encode_response(&json!("a <b> & 'c'")).unwrap();
        assert!(xml.contains("a &lt;b&gt; &amp; "), "{}", xml);
        assert_eq!(
            parse_response(&xml).unwrap(),
            MethodResponse::Value(json!("a <b> & 'c'"))
        );
    }

    #[test]
    fn test_parse_python_style_response() {
        let xml = r#"<?xml version='1.0'?>
<methodResponse>
<params>
<param>
<value><string>Server received: identifier=alice, amount=42 USD</string></value>
</param>
</params>
</methodResponse>
"#;
        assert_eq!(
            parse_response(xml).unwrap(),
            MethodResponse::Value(json!("Server received: identifier=alice, amount=42 USD"))
        );
    }

    #[test]
    fn test_parse_character_references_and_cdata() {
        let xml = "<methodResponse><params><param><value><struct>\
            <member><name>refs</name><value><string>caf&#233; &#x41;</string></value></member>\
            <member><name>cdata</name><value><string><![CDATA[a<b>c]]></string></value></member>\
            <member><name>mixed</name><value>x &amp; <![CDATA[<y>]]></value></member>\
            </struct></value></param></params></methodResponse>";
        assert_eq!(
            parse_response(xml).unwrap(),
            MethodResponse::Value(json!({
                "refs": "café A",
                "cdata": "a<b>c",
                "mixed": "x & <y>"
            }))
        );
    }

    #[test]
    fn test_string_whitespace_is_preserved() {
        let xml = "<methodResponse>\n  <params><param>\n    \
            <value><string>  padded </string></value>\n  </param></params>\n</methodResponse>";
        assert_eq!(
            parse_response(xml).unwrap(),
            MethodResponse::Value(json!("  padded "))
        );
    }

    #[test]
    fn test_mismatched_tags_are_protocol_errors() {
        assert!(matches!(
            parse_response("<methodResponse><params></param></methodResponse>"),
            Err(TriadError::ProtocolError { .. })
        ));
    }

    #[test]
    fn test_parse_untyped_and_nested_values() {
        let xml = "<methodResponse><params><param><value><struct>\
            <member><name>plain</name><value>hello</value></member>\
            <member><name>flags</name><value><array><data>\
            <value><boolean>1</boolean></value><value><i4>-3</i4></value>\
            <value><double>1.5</double></value></data></array></value></member>\
            <member><name>none</name><value><nil/></value></member>\
            </struct></value></param></params></methodResponse>";
        assert_eq!(
            parse_response(xml).unwrap(),
            MethodResponse::Value(json!({
                "plain": "hello",
                "flags": [true, -3, 1.5],
                "none": null
            }))
        );
    }

    #[test]
    fn test_parse_fault() {
        let xml =
            encode_fault(1, "<class 'Exception'>:method \"nope\" is not supported").unwrap();
        assert_eq!(
            parse_response(&xml).unwrap(),
            MethodResponse::Fault {
                code: 1,
                message: "<class 'Exception'>:method \"nope\" is not supported".to_string()
            }
        );
    }

    #[test]
    fn test_large_numbers_fall_back_to_double() {
        let xml = encode_response(&json!(5_000_000_000i64)).unwrap();
        assert!(xml.contains("<double>5000000000</double>"));
    }

    #[test]
    fn test_malformed_documents_are_protocol_errors() {
        assert!(matches!(
            parse_response("<html>oops</html>"),
            Err(TriadError::ProtocolError { .. })
        ));
        assert!(matches!(
            parse_response("<methodResponse><params><param><value><int>x</int></value></param></params></methodResponse>"),
            Err(TriadError::ProtocolError { .. })
        ));
        assert!(matches!(
            parse_method_call(""),
            Err(TriadError::ProtocolError { .. })
        ));
    }

    #[test]
    fn test_method_call_without_params() {
        let call = parse_method_call(
            "<?xml version=\"1.0\"?><methodCall><methodName>system.listMethods</methodName><params/></methodCall>",
        )
        .unwrap();
        assert_eq!(call.method, "system.listMethods");
        assert!(call.params.is_empty());
    }
}
