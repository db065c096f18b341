//! HTML dashboard.

use std::fmt::Write as _;

use soilsense_core::codes::{CropType, SoilType};
use strum::IntoEnumIterator;

use crate::Snapshot;

/// Render the dashboard for `snapshot`.
pub fn dashboard(snapshot: &Snapshot, model_loaded: bool) -> String {
  let reading = &snapshot.reading;
  let mut html = String::with_capacity(4096);

  html.push_str(concat!(
    "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n",
    "<meta charset=\"utf-8\">\n",
    "<title>SoilSense</title>\n",
    "<style>",
    "body{font-family:sans-serif;margin:2rem;max-width:48rem}",
    "table{border-collapse:collapse}",
    "td,th{padding:.3rem .8rem;border-bottom:1px solid #ddd;text-align:left}",
    ".fertilizer{font-size:1.6rem;font-weight:bold}",
    ".warning{color:#a15c00}",
    "</style>\n</head>\n<body>\n<h1>Soil monitor</h1>\n",
  ));

  html.push_str("<table>\n");
  for (name, value, unit) in [
    ("Temperature", reading.temperature, "°C"),
    ("Humidity", reading.humidity, "%"),
    ("Moisture", reading.moisture, "%"),
    ("Nitrogen", reading.nitrogen, "mg/kg"),
    ("Phosphorus", reading.phosphorus, "mg/kg"),
    ("Potassium", reading.potassium, "mg/kg"),
  ] {
    let _ = writeln!(
      html,
      "<tr><th>{name}</th><td id=\"{}\">{value:.1} {unit}</td></tr>",
      name.to_lowercase()
    );
  }
  html.push_str("</table>\n");

  html.push_str("<p><label>Soil type <select id=\"soil_type\">");
  for soil in SoilType::iter() {
    push_option(&mut html, soil.code(), &soil.to_string(), soil == reading.soil_type);
  }
  html.push_str("</select></label>\n<label>Crop type <select id=\"crop_type\">");
  for crop in CropType::iter() {
    push_option(&mut html, crop.code(), &crop.to_string(), crop == reading.crop_type);
  }
  html.push_str("</select></label></p>\n");

  let _ = writeln!(
    html,
    "<p>Recommended fertilizer: <span class=\"fertilizer\" id=\"fertilizer\">{}</span></p>",
    escape(&snapshot.recommended_fertilizer)
  );
  if !model_loaded {
    html.push_str(
      "<p class=\"warning\">Model not loaded. Train it with <code>soilsense train</code>.</p>\n",
    );
  }
  let _ = writeln!(
    html,
    "<p>Last update: <span id=\"timestamp\">{}</span> \
     <button id=\"refresh\">Refresh</button></p>",
    snapshot.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
  );
  html.push_str("<p class=\"warning\" id=\"message\"></p>\n");

  html.push_str(SCRIPT);
  html.push_str("</body>\n</html>\n");
  html
}

const SCRIPT: &str = r#"<script>
async function send(method, path, body) {
  const opts = { method, headers: { "Content-Type": "application/json" } };
  if (body !== undefined) opts.body = JSON.stringify(body);
  const res = await fetch(path, opts);
  const json = await res.json();
  document.getElementById("message").textContent =
    json.status === "error" ? json.message : (json.warning || "");
  if (json.recommended_fertilizer)
    document.getElementById("fertilizer").textContent = json.recommended_fertilizer;
  return json;
}
document.getElementById("soil_type").addEventListener("change", e =>
  send("POST", "/update-soil", { soil_type: Number(e.target.value) }));
document.getElementById("crop_type").addEventListener("change", e =>
  send("POST", "/update-crop", { crop_type: Number(e.target.value) }));
document.getElementById("refresh").addEventListener("click", async () => {
  const json = await send("GET", "/sensor-data");
  if (json.data) location.reload();
});
</script>
"#;

fn push_option(html: &mut String, code: u8, name: &str, selected: bool) {
  let _ = write!(
    html,
    "<option value=\"{code}\"{}>{}</option>",
    if selected { " selected" } else { "" },
    escape(name)
  );
}

fn escape(raw: &str) -> String {
  let mut out = String::with_capacity(raw.len());
  for c in raw.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      _ => out.push(c),
    }
  }
  out
}
