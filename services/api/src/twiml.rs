//! Call-control documents that point the telephony provider at our media
//! stream endpoints.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use std::io::Cursor;

#[derive(Debug, thiserror::Error)]
#[error("failed to write call-control document: {0}")]
pub struct TwimlError(String);

fn write(writer: &mut Writer<Cursor<Vec<u8>>>, event: Event<'_>) -> Result<(), TwimlError> {
    writer
        .write_event(event)
        .map_err(|e| TwimlError(e.to_string()))
}

/// Builds a `<Connect><Stream>` document for `stream_url`, forwarding each
/// `(name, value)` pair as a stream `<Parameter>`. Attribute values are
/// escaped by the writer.
pub fn connect_stream(
    stream_url: &str,
    parameters: &[(&str, &str)],
) -> Result<String, TwimlError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    write(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;
    write(&mut writer, Event::Start(BytesStart::new("Response")))?;
    write(&mut writer, Event::Start(BytesStart::new("Connect")))?;

    let mut stream = BytesStart::new("Stream");
    stream.push_attribute(("url", stream_url));
    if parameters.is_empty() {
        write(&mut writer, Event::Empty(stream))?;
    } else {
        write(&mut writer, Event::Start(stream))?;
        for (name, value) in parameters {
            let mut parameter = BytesStart::new("Parameter");
            parameter.push_attribute(("name", *name));
            parameter.push_attribute(("value", *value));
            write(&mut writer, Event::Empty(parameter))?;
        }
        write(&mut writer, Event::End(BytesEnd::new("Stream")))?;
    }

    write(&mut writer, Event::End(BytesEnd::new("Connect")))?;
    write(&mut writer, Event::End(BytesEnd::new("Response")))?;

    String::from_utf8(writer.into_inner().into_inner()).map_err(|e| TwimlError(e.to_string()))
}
