use serde_json::{Map, Value};

/// Serializes registration parameters into the Campaign Classic XML form
/// `<additionalParameters><param name="k" value="v"/>...</additionalParameters>`.
///
/// Entries keep their insertion order, null values are skipped.
pub fn serialize_map(input: &Map<String, Value>) -> String {
    let mut out = String::from("<additionalParameters>");
    for (key, value) in input.iter() {
        let value = match render_value(value) {
            Some(value) => value,
            None => continue,
        };
        out.push_str("<param name=\"");
        escape_xml_attr(&mut out, key);
        out.push_str("\" value=\"");
        escape_xml_attr(&mut out, &value);
        out.push_str("\"/>");
    }
    out.push_str("</additionalParameters>");
    out
}

fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(if *b { "true" } else { "false" }.to_owned()),
        Value::Number(n) => Some(if let Some(i) = n.as_i64() {
            i.to_string()
        } else if let Some(u) = n.as_u64() {
            u.to_string()
        } else {
            render_float(n.as_f64().unwrap_or_default())
        }),
        other => Some(other.to_string()),
    }
}

//Floats always carry a decimal point, 1.0 rather than 1
fn render_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

fn escape_xml_attr(out: &mut String, attr: &str) {
    for c in attr.chars() {
        match c {
            '\r' | '\n' => {}
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '&' => out.push_str("&amp;"),
            c => out.push(c),
        }
    }
}
