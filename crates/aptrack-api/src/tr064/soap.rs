// SOAP envelope construction and response scraping for TR-064 actions.
//
// Responses are tiny and fixed-shape, so a pull parser that looks for a
// single element by local name is enough; namespace prefixes vary between
// firmware versions and are ignored.

use quick_xml::Reader;
use quick_xml::events::Event;

pub(crate) const HOSTS_SERVICE: &str = "urn:dslforum-org:service:Hosts:1";
pub(crate) const HOSTS_CONTROL_URL: &str = "/upnp/control/hosts";

/// Build the request body for an argument-less action.
pub(crate) fn envelope(service: &str, action: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
         <s:Envelope s:encodingStyle=\"http://schemas.xmlsoap.org/soap/encoding/\" \
         xmlns:s=\"http://schemas.xmlsoap.org/soap/envelope/\">\
         <s:Body><u:{action} xmlns:u=\"{service}\"></u:{action}></s:Body>\
         </s:Envelope>"
    )
}

/// Value of the `SOAPAction` header for an action.
pub(crate) fn soap_action(service: &str, action: &str) -> String {
    format!("\"{service}#{action}\"")
}

/// Text of the first element whose local name is `name`, unescaped.
///
/// An empty element yields `Some("")`; a missing one yields `None`.
pub(crate) fn extract_value(xml: &str, name: &str) -> Result<Option<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == name.as_bytes() => {
                let raw = reader.read_text(e.name())?;
                let text = quick_xml::escape::unescape(&raw)?;
                return Ok(Some(text.into_owned()));
            }
            Event::Empty(e) if e.local_name().as_ref() == name.as_bytes() => {
                return Ok(Some(String::new()));
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// Human readable description of a SOAP fault body, if it is one.
pub(crate) fn fault_message(xml: &str) -> Option<String> {
    let code = extract_value(xml, "errorCode").ok().flatten();
    let description = extract_value(xml, "errorDescription").ok().flatten();
    match (code, description) {
        (Some(code), Some(description)) => Some(format!("UPnP error {code}: {description}")),
        (Some(code), None) => Some(format!("UPnP error {code}")),
        (None, _) => extract_value(xml, "faultstring").ok().flatten(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const HOST_LIST_PATH_RESPONSE: &str = r#"<?xml version="1.0"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">
<s:Body>
<u:X_AVM-DE_GetHostListPathResponse xmlns:u="urn:dslforum-org:service:Hosts:1">
<NewX_AVM-DE_HostListPath>/devicehostlist.lua?sid=8f3a&amp;x=1</NewX_AVM-DE_HostListPath>
</u:X_AVM-DE_GetHostListPathResponse>
</s:Body>
</s:Envelope>"#;

    const FAULT_RESPONSE: &str = r#"<?xml version="1.0"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
<s:Body>
<s:Fault>
<faultcode>s:Client</faultcode>
<faultstring>UPnPError</faultstring>
<detail>
<UPnPError xmlns="urn:dslforum-org:control-1-0">
<errorCode>401</errorCode>
<errorDescription>Invalid Action</errorDescription>
</UPnPError>
</detail>
</s:Fault>
</s:Body>
</s:Envelope>"#;

    #[test]
    fn envelope_names_action_and_service() {
        let body = envelope(HOSTS_SERVICE, "X_AVM-DE_GetHostListPath");
        assert!(body.contains(
            "<u:X_AVM-DE_GetHostListPath xmlns:u=\"urn:dslforum-org:service:Hosts:1\">"
        ));
        assert!(body.ends_with("</s:Envelope>"));
        assert_eq!(
            soap_action(HOSTS_SERVICE, "X_AVM-DE_GetHostListPath"),
            "\"urn:dslforum-org:service:Hosts:1#X_AVM-DE_GetHostListPath\""
        );
    }

    #[test]
    fn extracts_value_ignoring_prefixes_and_entities() {
        let value = extract_value(HOST_LIST_PATH_RESPONSE, "NewX_AVM-DE_HostListPath").unwrap();
        assert_eq!(value.as_deref(), Some("/devicehostlist.lua?sid=8f3a&x=1"));
    }

    #[test]
    fn missing_and_empty_elements() {
        assert_eq!(
            extract_value(HOST_LIST_PATH_RESPONSE, "NewHostName").unwrap(),
            None
        );
        assert_eq!(
            extract_value("<a><NewValue/></a>", "NewValue").unwrap().as_deref(),
            Some("")
        );
    }

    #[test]
    fn fault_message_prefers_upnp_details() {
        assert_eq!(
            fault_message(FAULT_RESPONSE).as_deref(),
            Some("UPnP error 401: Invalid Action")
        );
        assert_eq!(fault_message(HOST_LIST_PATH_RESPONSE), None);
    }
}
