//! SOAP translation of a [`SoapEnvelope`].
//!
//! Element names, attribute names and namespaces are fixed by the power-on
//! service contract. The operation element is qualified with the service
//! namespace, the `ProcessorUser` attribute with the common-DTO namespace, and
//! everything below the operation element is unqualified.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::domain::{RelayError, Request, RequestBody, SoapEnvelope, UserDefinedParameters};

pub const SOAP_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const POWER_ON_NS: &str = "http://www.symxchange.generated.symitar.com/poweron";
pub const COMMON_DTO_NS: &str = "http://www.symxchange.generated.symitar.com/common/dto/common";

const INDENT_SIZE: usize = 2;

/// A translated request document: UTF-8, no byte-order mark, indented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireDocument(String);

impl WireDocument {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Translate an envelope into its wire document.
///
/// Pure and deterministic: identical input yields byte-identical output.
/// Absent optional fields are omitted, never written as empty elements.
pub fn translate(envelope: &SoapEnvelope) -> Result<WireDocument, RelayError> {
    let mut w = SoapWriter::new();

    w.write(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let mut root = BytesStart::new("soapenv:Envelope");
    root.push_attribute(("xmlns:soapenv", SOAP_ENVELOPE_NS));
    root.push_attribute(("xmlns:pow", POWER_ON_NS));
    root.push_attribute(("xmlns:com", COMMON_DTO_NS));
    w.start(root)?;

    w.empty(BytesStart::new("soapenv:Header"))?;

    w.start(BytesStart::new("soapenv:Body"))?;
    w.start(BytesStart::new("pow:executePowerOnReturnArray"))?;
    write_request(&mut w, &envelope.body.execute_power_on_return_array.request)?;
    w.end("pow:executePowerOnReturnArray")?;
    w.end("soapenv:Body")?;

    w.end("soapenv:Envelope")?;

    w.finish()
}

fn write_request(w: &mut SoapWriter, request: &Request) -> Result<(), RelayError> {
    let mut start = BytesStart::new("Request");
    start.push_attribute(("BranchId", request.branch_id.to_string().as_str()));
    w.start(start)?;

    let mut credentials = BytesStart::new("Credentials");
    credentials.push_attribute((
        "com:ProcessorUser",
        request.credentials.processor_user.as_str(),
    ));
    w.start(credentials)?;
    w.start(BytesStart::new("AdministrativeCredentials"))?;
    w.text_element(
        "Password",
        &request.credentials.administrative_credentials.password,
    )?;
    w.end("AdministrativeCredentials")?;
    w.end("Credentials")?;

    let mut device = BytesStart::new("DeviceInformation");
    device.push_attribute((
        "DeviceType",
        request.device_information.device_type.as_str(),
    ));
    device.push_attribute((
        "DeviceNumber",
        request.device_information.device_number.to_string().as_str(),
    ));
    w.empty(device)?;

    w.start(BytesStart::new("Header"))?;
    w.text_element("MessageID", &request.header.message_id)?;
    w.end("Header")?;

    write_body(w, &request.body)?;

    w.end("Request")
}

fn write_body(w: &mut SoapWriter, body: &RequestBody) -> Result<(), RelayError> {
    w.start(BytesStart::new("Body"))?;
    if let Some(file) = &body.file {
        w.text_element("File", file)?;
    }
    if let Some(session) = body.rg_session {
        w.text_element("RGSession", &session.to_string())?;
    }
    if let Some(params) = &body.user_defined_parameters {
        write_parameters(w, params)?;
    }
    if let Some(user) = &body.user {
        w.text_element("User", user)?;
    }
    w.end("Body")
}

fn write_parameters(w: &mut SoapWriter, params: &UserDefinedParameters) -> Result<(), RelayError> {
    w.start(BytesStart::new("UserDefinedParameters"))?;
    for chr in &params.characters {
        w.start(BytesStart::new("RGUserChr"))?;
        w.text_element("ID", &chr.id.to_string())?;
        w.text_element("Value", &chr.value)?;
        w.end("RGUserChr")?;
    }
    for num in &params.numbers {
        w.start(BytesStart::new("RGUserNum"))?;
        w.text_element("ID", &num.id.to_string())?;
        w.text_element("Value", &num.value.to_string())?;
        w.end("RGUserNum")?;
    }
    w.end("UserDefinedParameters")
}

/// Thin wrapper so every write maps onto [`RelayError::Translate`].
struct SoapWriter {
    inner: Writer<Vec<u8>>,
}

impl SoapWriter {
    fn new() -> Self {
        Self {
            inner: Writer::new_with_indent(Vec::new(), b' ', INDENT_SIZE),
        }
    }

    fn write(&mut self, event: Event<'_>) -> Result<(), RelayError> {
        self.inner
            .write_event(event)
            .map_err(|e| RelayError::Translate(e.to_string()))
    }

    fn start(&mut self, element: BytesStart<'_>) -> Result<(), RelayError> {
        self.write(Event::Start(element))
    }

    fn empty(&mut self, element: BytesStart<'_>) -> Result<(), RelayError> {
        self.write(Event::Empty(element))
    }

    fn end(&mut self, name: &str) -> Result<(), RelayError> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    fn text_element(&mut self, name: &str, text: &str) -> Result<(), RelayError> {
        self.start(BytesStart::new(name))?;
        self.write(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn finish(self) -> Result<WireDocument, RelayError> {
        String::from_utf8(self.inner.into_inner())
            .map(WireDocument)
            .map_err(|e| RelayError::Translate(e.to_string()))
    }
}
