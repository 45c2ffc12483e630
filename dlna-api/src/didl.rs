//! Minimal DIDL-Lite metadata for `SetAVTransportURI`
//!
//! One `<item>` carrying only a `dc:title` and the `upnp:class`. No album art,
//! duration or `res` protocol info is generated; renderers that insist on
//! those will show the title only or ignore the metadata.

use quick_xml::escape::escape;

const DIDL_OPEN: &str = concat!(
    r#"<DIDL-Lite xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/""#,
    r#" xmlns:dc="http://purl.org/dc/elements/1.1/""#,
    r#" xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/">"#
);

/// DIDL-Lite fragment describing one item titled `title`
pub fn item_metadata(title: &str) -> String {
    format!(
        r#"{}<item id="0" parentID="-1" restricted="1"><dc:title>{}</dc:title><upnp:class>object.item</upnp:class></item></DIDL-Lite>"#,
        DIDL_OPEN,
        escape(title)
    )
}
