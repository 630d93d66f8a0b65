use super::RemoteService;
use crate::error::RemoteError;
use async_trait::async_trait;
use regex::{Captures, Regex};
use reqwest::Client;

const LABEL: &str = "zxing.org";
// Label cell, then the value cell; tag names and attributes vary by deployment
const RESULT_CELL: &str = r"(?is)<td[^>]*>\s*Parsed Result\s*</td>\s*<td[^>]*>(.*?)</td>";
const TAG: &str = r"(?s)<[^>]*>";
const ENTITY: &str = r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);";

/// zxing.org online decoder: `GET <endpoint>?u=<image url>`, answered with
/// an HTML table
pub struct ZxingOrg {
    client: Client,
    endpoint: String,
}

impl ZxingOrg {
    /// Service at `endpoint`
    pub fn new(client: Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
        }
    }
}

#[async_trait]
impl RemoteService for ZxingOrg {
    fn label(&self) -> &str {
        LABEL
    }

    async fn decode_url(&self, image_url: &str) -> Result<String, RemoteError> {
        let http = |source| RemoteError::Http {
            service: LABEL.to_string(),
            source,
        };
        let html = self
            .client
            .get(&self.endpoint)
            .query(&[("u", image_url)])
            .send()
            .await
            .map_err(http)?
            .error_for_status()
            .map_err(http)?
            .text()
            .await
            .map_err(http)?;

        parse_result_cell(&html).ok_or_else(|| RemoteError::NoPayload {
            service: LABEL.to_string(),
        })
    }
}

/// Text of the table cell that follows the "Parsed Result" label cell
pub fn parse_result_cell(html: &str) -> Option<String> {
    let cell = Regex::new(RESULT_CELL).ok()?;
    let tags = Regex::new(TAG).ok()?;
    let body = cell.captures(html)?.get(1)?.as_str();

    let text = unescape(tags.replace_all(body, "").trim());
    (!text.is_empty()).then_some(text)
}

/// Decode character references in one pass, so `&amp;lt;` stays `&lt;`.
/// Unknown named entities are left as written.
fn unescape(text: &str) -> String {
    let Ok(entity) = Regex::new(ENTITY) else {
        return text.to_string();
    };
    entity
        .replace_all(text, |caps: &Captures<'_>| {
            let whole = &caps[0];
            let name = &caps[1];
            let decoded = if let Some(hex) = name
                .strip_prefix("#x")
                .or_else(|| name.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match name {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    _ => None,
                }
            };
            decoded.map_or_else(|| whole.to_string(), String::from)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body><table id="result">
<tr><td>Raw text</td><td><pre>https://example.com/?a=1&amp;b=2</pre></td></tr>
<tr><td>Parsed Result Type</td><td>URI</td></tr>
<tr><td>Parsed Result</td><td><pre style="margin:0">https://example.com/?a=1&amp;b=2</pre></td></tr>
</table></body></html>"#;

    #[test]
    fn test_parses_result_cell() {
        // "Parsed Result Type" comes first; only the exact label counts
        assert_eq!(
            parse_result_cell(PAGE).as_deref(),
            Some("https://example.com/?a=1&b=2")
        );
    }

    #[test]
    fn test_unescapes_entities() {
        let page = "<td>Parsed Result</td><td><pre>&lt;tag&gt; &quot;q&quot; it&#39;s &amp;amp;</pre></td>";
        assert_eq!(
            parse_result_cell(page).as_deref(),
            Some("<tag> \"q\" it's &amp;")
        );
    }

    #[test]
    fn test_missing_or_empty_cell() {
        assert_eq!(parse_result_cell("<html>No barcode was found</html>"), None);
        assert_eq!(
            parse_result_cell("<td>Parsed Result</td><td><pre> </pre></td>"),
            None
        );
    }

    #[test]
    fn test_tag_case_and_attributes() {
        let page = "<TR><TD class=\"k\">Parsed Result</TD>\n<TD valign=top><PRE>hello</PRE></TD></TR>";
        assert_eq!(parse_result_cell(page).as_deref(), Some("hello"));
    }

    #[test]
    fn test_numeric_references() {
        let page = "<td>Parsed Result</td><td>https:&#x2F;&#x2F;example.com&#47;a</td>";
        assert_eq!(
            parse_result_cell(page).as_deref(),
            Some("https://example.com/a")
        );
    }

    #[test]
    fn test_single_pass_and_unknown_entities() {
        let page = "<td>Parsed Result</td><td>&amp;lt; &bogus; &#xZZ;</td>";
        assert_eq!(
            parse_result_cell(page).as_deref(),
            Some("&lt; &bogus; &#xZZ;")
        );
    }
}
