//! Embedded report template

/// Report layout - loaded from templates/report.typ
pub const REPORT_TEMPLATE: &str = include_str!("../templates/report.typ");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_reads_report_input() {
        assert!(REPORT_TEMPLATE.contains("sys.inputs.at(\"report\""));
        assert!(typst::syntax::parse(REPORT_TEMPLATE).errors().is_empty());
    }
}
