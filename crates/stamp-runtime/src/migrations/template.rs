/// Body used when a migration is created without content.
pub const DEFAULT_BODY: &str = "change do\nend\n";

/// Wrap a migration body in the `Sequel.migration` envelope.
///
/// Every non-empty line of the body is indented by one tab.
pub fn migration_content(content: Option<&str>) -> String {
    let body = content
        .filter(|c| !c.trim().is_empty())
        .unwrap_or(DEFAULT_BODY);

    let indented = body
        .lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("\t{}", line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "# frozen_string_literal: true\n\nSequel.migration do\n\t{}\nend\n",
        indented.trim()
    )
}
