//! Output file naming.

use certify_core::types::{ColumnMap, Field, RosterRecord};
use certify_renderer::LayoutSpec;

/// Prefix used when neither the record nor the layout provides one.
pub const DEFAULT_PREFIX: &str = "Certificate";

/// `{prefix}_{Full_Name}.pdf`, whitespace runs in the name collapsed to `_`.
///
/// Path separators in either part are replaced so the name stays a single
/// path component.
pub fn output_file_name(prefix: &str, full_name: &str) -> String {
    let name = full_name.split_whitespace().collect::<Vec<_>>().join("_");
    format!("{}_{}.pdf", sanitize(prefix), sanitize(&name))
}

/// [`output_file_name`] with the roster row appended, for names already taken
/// in the same batch.
pub fn row_file_name(prefix: &str, full_name: &str, row: usize) -> String {
    let name = full_name.split_whitespace().collect::<Vec<_>>().join("_");
    format!("{}_{}_row{row}.pdf", sanitize(prefix), sanitize(&name))
}

/// Specialization when present, else the layout's prefix, else [`DEFAULT_PREFIX`].
pub fn prefix_for(record: &RosterRecord, columns: &ColumnMap, layout: &LayoutSpec) -> String {
    record
        .text(columns, Field::Specialization)
        .or_else(|| layout.file_prefix.clone())
        .unwrap_or_else(|| DEFAULT_PREFIX.to_string())
}

fn sanitize(part: &str) -> String {
    part.trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '-',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use certify_core::types::CellValue;
    use certify_renderer::LayoutVariant;
    use rstest::rstest;

    #[rstest]
    #[case("Bioinformatics", "Jane Doe", "Bioinformatics_Jane_Doe.pdf")]
    #[case("Oxford", "Ana  María de la Cruz", "Oxford_Ana_María_de_la_Cruz.pdf")]
    #[case("AI/ML", "Li", "AI-ML_Li.pdf")]
    fn file_names(#[case] prefix: &str, #[case] name: &str, #[case] expected: &str) {
        assert_eq!(output_file_name(prefix, name), expected);
    }

    #[test]
    fn row_file_name_appends_row() {
        assert_eq!(row_file_name("Robotics", "Jane  Doe", 7), "Robotics_Jane_Doe_row7.pdf");
    }

    #[test]
    fn prefix_falls_back_to_layout() {
        let columns = ColumnMap::default();
        let badge = LayoutVariant::PortraitBadge.spec();
        let bare = RosterRecord::new(2).with("Full Name", CellValue::Text("Jane".into()));
        assert_eq!(prefix_for(&bare, &columns, &badge), "Oxford");

        let wide = LayoutVariant::WideLandscape.spec();
        assert_eq!(prefix_for(&bare, &columns, &wide), DEFAULT_PREFIX);

        let with_spec = bare.with("Specialization", CellValue::Text("Robotics".into()));
        assert_eq!(prefix_for(&with_spec, &columns, &badge), "Robotics");
    }
}
