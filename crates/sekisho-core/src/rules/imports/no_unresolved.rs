//! no-unresolved rule (I001): module specifiers that resolve to no file

use crate::declare_rule;
use crate::diagnostic::Diagnostic;
use crate::parser::ParsedFile;
use crate::resolve::is_core_module;
use crate::rules::helpers::module_requests;
use crate::rules::{Rule, RuleContext, RuleMetadata};
use crate::visitor::VisitorContext;

declare_rule!(
    NoUnresolved,
    id = "I001",
    name = "no-unresolved",
    description = "Ensure imported modules resolve to a file on disk",
    category = StaticAnalysis,
    severity = Error,
    examples = "// Bad\nimport { helper } from './helpr';\nconst lib = require('./missing');\n\n// Good\nimport { helper } from './helper';\nimport fs from 'node:fs';"
);

impl Rule for NoUnresolved {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn check(&self, file: &ParsedFile, ctx: &RuleContext) -> Vec<Diagnostic> {
        let Some(module) = file.module() else {
            return Vec::new();
        };

        let visitor = VisitorContext::new(file);
        let settings = ctx.exports.settings();

        module_requests(module, &visitor)
            .into_iter()
            .filter(|request| !request.specifier.is_empty())
            .filter(|request| !is_core_module(&request.specifier, settings))
            .filter(|request| ctx.exports.resolve(&request.specifier, file.path()).is_none())
            .map(|request| {
                let (line, column, end_line, end_column) = visitor.span_to_range(request.span);
                Diagnostic::new(
                    self.metadata.id,
                    self.metadata.severity,
                    format!(
                        "Unable to resolve path to module '{}'.",
                        request.specifier
                    ),
                    visitor.filename(),
                    line,
                    column,
                )
                .with_end(end_line, end_column)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Severity;
    use crate::rules::imports::test_support::{messages, run};

    const FILES: &[(&str, &str)] = &[
        ("/project/src/a.js", "export const a = 1;"),
        ("/project/src/lib/index.ts", "export default 1;"),
    ];

    fn run_no_unresolved(code: &str) -> Vec<Diagnostic> {
        run(&NoUnresolved::new(), FILES, code)
    }

    #[test]
    fn resolved_imports_pass() {
        let diagnostics = run_no_unresolved(
            "import { a } from './a';\nimport lib from './lib';\nexport * from './a.js';",
        );

        assert!(diagnostics.is_empty());
    }

    #[test]
    fn reports_missing_relative_import() {
        let diagnostics = run_no_unresolved("import { a } from './b';");

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].rule_id, "I001");
        assert_eq!(diagnostics[0].severity, Severity::Error);
        assert_eq!(
            diagnostics[0].message,
            "Unable to resolve path to module './b'."
        );
        assert_eq!((diagnostics[0].line, diagnostics[0].column), (1, 19));
    }

    #[test]
    fn reports_require_reexport_and_dynamic_import() {
        let diagnostics = run_no_unresolved(
            "const x = require('./x');\nexport { y } from './y';\nimport('./z');",
        );

        assert_eq!(
            messages(&diagnostics),
            vec![
                "Unable to resolve path to module './x'.",
                "Unable to resolve path to module './y'.",
                "Unable to resolve path to module './z'.",
            ]
        );
    }

    #[test]
    fn builtins_are_not_reported() {
        let diagnostics = run_no_unresolved(
            "import fs from 'fs';\nimport path from 'node:path';\nconst { join } = require('path/posix');",
        );

        assert!(diagnostics.is_empty());
    }

    #[test]
    fn missing_package_is_reported() {
        let diagnostics = run_no_unresolved("import pad from 'left-pad';");

        assert_eq!(
            messages(&diagnostics),
            vec!["Unable to resolve path to module 'left-pad'."]
        );
    }
}
