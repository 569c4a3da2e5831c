use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use super::kind::PropertyType;

const IMAGE_SERVICE_URL: &str = "https://readdy.ai/api/search-image";

/// Characters a URI component may carry unescaped: letters, digits and
/// `-_.!~*'()`. Spaces become `%20`, never `+`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

fn scene(kind: PropertyType) -> &'static str {
    match kind {
        PropertyType::House => "beautiful modern family house exterior with large windows, manicured lawn, contemporary architecture, residential neighborhood setting, natural lighting, clean architectural lines, inviting entrance",
        PropertyType::Condo => "modern luxury condominium building exterior, sleek glass facade, urban setting, contemporary high-rise architecture, clean lines, sophisticated design, city backdrop",
        PropertyType::Penthouse => "luxury penthouse exterior view, upscale high-rise building, sophisticated architecture, panoramic city views, modern glass design, premium residential building",
        PropertyType::Townhouse => "elegant townhouse exterior, charming residential architecture, well-maintained facade, urban residential setting, classic design elements, inviting entrance",
        PropertyType::Estate => "magnificent luxury estate exterior, grand architecture, expansive grounds, impressive facade, upscale residential property, majestic design, pristine landscaping",
        PropertyType::Duplex => "attractive duplex home exterior, modern residential architecture, symmetrical design, well-maintained property, family-friendly neighborhood, clean contemporary lines",
        PropertyType::Loft => "modern loft building exterior, industrial architecture, converted warehouse style, urban setting, large windows, contemporary residential conversion",
    }
}

/// Text prompt sent to the image service for a listing
pub fn image_prompt(title: &str, kind: PropertyType) -> String {
    format!("{}, {}", scene(kind), title.to_lowercase())
}

/// Image service URL for a listing; `seq` keeps URLs for the same prompt distinct.
pub fn image_url(title: &str, kind: PropertyType, seq: i64) -> String {
    let prompt = image_prompt(title, kind);
    format!(
        "{}?query={}&width=600&height=400&seq=prop{}&orientation=landscape",
        IMAGE_SERVICE_URL,
        utf8_percent_encode(&prompt, URI_COMPONENT),
        seq
    )
}
