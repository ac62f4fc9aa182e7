use anyhow::Result;
use curl_sections::{ParsedRequest, SectionSettings, render_sections};
use serde_json::json;

fn main() -> Result<()> {
    let input = r#"curl 'https://api.github.com/user/email/visibility?dry_run=1' \
    -X PATCH \
    -d '{"visibility":"private"}' \
    -H "Accept: application/vnd.github+json" \
    -H "Authorization: Bearer {{ token }}"\
    -H "X-GitHub-Api-Version: 2022-11-28" \
    --compressed"#;
    let context = json!({ "token": "abcd1234" });
    let parsed = ParsedRequest::load(input, context)?;
    println!("{parsed:#?}");

    for section in render_sections(&parsed, &SectionSettings::default())? {
        println!("{section}\n");
    }
    Ok(())
}
