//! no-cycle rule (I006): imports that lead back to the importing module
//!
//! The walk is breadth-first over the export maps' import summaries, so the
//! shortest route is the one reported. `max_depth` bounds how many hops are
//! followed; type-only imports are never followed.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use path_clean::PathClean;

use crate::declare_rule;
use crate::diagnostic::Diagnostic;
use crate::exports::ExportMap;
use crate::parser::ParsedFile;
use crate::rules::helpers::{RequestKind, module_requests};
use crate::rules::{Rule, RuleContext, RuleMetadata};
use crate::visitor::VisitorContext;

declare_rule!(
    NoCycle,
    id = "I006",
    name = "no-cycle",
    description = "Forbid a module from importing a module with a dependency path back to itself",
    category = StaticAnalysis,
    severity = Warning,
    examples = "// dep-b.js\nimport './dep-a.js';\nexport function b() {}\n\n// dep-a.js (Bad)\nimport { b } from './dep-b.js';"
);

/// One hop of a cycle: the specifier as written and the line it is on.
type Hop = (String, usize);

impl Rule for NoCycle {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn check(&self, file: &ParsedFile, ctx: &RuleContext) -> Vec<Diagnostic> {
        let Some(module) = file.module() else {
            return Vec::new();
        };

        let visitor = VisitorContext::new(file);
        let me = file.path().clean();

        module_requests(module, &visitor)
            .into_iter()
            .filter(|request| !request.type_only && request.kind != RequestKind::DynamicImport)
            .filter_map(|request| {
                let imported = ctx.exports.get(&request.specifier, file.path())?;
                if imported.path() == me {
                    return None;
                }
                let route = find_cycle(imported, &me, ctx)?;
                let message = if route.is_empty() {
                    "Dependency cycle detected.".to_string()
                } else {
                    let hops: Vec<String> = route
                        .iter()
                        .map(|(specifier, line)| format!("{}:{}", specifier, line))
                        .collect();
                    format!("Dependency cycle via {}", hops.join("=>"))
                };
                let (line, column, end_line, end_column) = visitor.span_to_range(request.span);
                Some(
                    Diagnostic::new(
                        self.metadata.id,
                        self.metadata.severity,
                        message,
                        visitor.filename(),
                        line,
                        column,
                    )
                    .with_end(end_line, end_column),
                )
            })
            .collect()
    }
}

/// Route from `start` back to `target`, if one exists within `max_depth` hops.
fn find_cycle(start: Rc<ExportMap>, target: &Path, ctx: &RuleContext) -> Option<Vec<Hop>> {
    let mut queue = VecDeque::from([(start, Vec::<Hop>::new())]);
    let mut traversed: HashSet<PathBuf> = HashSet::new();

    while let Some((map, route)) = queue.pop_front() {
        if !traversed.insert(map.path().to_path_buf()) {
            continue;
        }

        for (path, imported) in map.imports() {
            if imported.type_only {
                continue;
            }
            if path == target {
                return Some(route);
            }
            if traversed.contains(path) || route.len() + 1 >= ctx.options.max_depth {
                continue;
            }
            if let Some(next) = ctx.exports.load(path) {
                let mut next_route = route.clone();
                next_route.push((imported.specifier.clone(), imported.location.line));
                queue.push_back((next, next_route));
            }
        }
    }

    tracing::trace!(from = %target.display(), traversed = traversed.len(), "no cycle found");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleOptions;
    use crate::rules::imports::test_support::{messages, run, run_with_options};

    fn run_no_cycle(files: &[(&str, &str)], code: &str) -> Vec<Diagnostic> {
        run(&NoCycle::new(), files, code)
    }

    #[test]
    fn reports_direct_cycle() {
        let diagnostics = run_no_cycle(
            &[("/project/src/b.js", "import { main } from './main.js';\nexport const b = 1;")],
            "import { b } from './b';\nexport const main = 1;",
        );

        assert_eq!(messages(&diagnostics), vec!["Dependency cycle detected."]);
        assert_eq!(diagnostics[0].rule_id, "I006");
        assert_eq!((diagnostics[0].line, diagnostics[0].column), (1, 19));
    }

    #[test]
    fn reports_route_of_longer_cycle() {
        let files = [
            ("/project/src/b.js", "import './c.js';"),
            ("/project/src/c.js", "export const c = 1;\nexport * from './main.js';"),
        ];

        let diagnostics = run_no_cycle(&files, "import './b.js';");

        assert_eq!(messages(&diagnostics), vec!["Dependency cycle via ./c.js:1"]);
    }

    #[test]
    fn max_depth_limits_the_walk() {
        let files = [
            ("/project/src/b.js", "import './c.js';"),
            ("/project/src/c.js", "import './main.js';"),
        ];

        let diagnostics = run_with_options(
            &NoCycle::new(),
            &files,
            "import './b.js';",
            RuleOptions { max_depth: 1 },
        );

        assert!(diagnostics.is_empty());
    }

    #[test]
    fn acyclic_graph_passes() {
        let files = [
            ("/project/src/b.js", "import './c.js';\nexport const b = 1;"),
            ("/project/src/c.js", "export const c = 1;"),
        ];

        assert!(run_no_cycle(&files, "import { b } from './b.js';").is_empty());
    }

    #[test]
    fn commonjs_requires_are_followed() {
        let files = [("/project/src/b.js", "const main = require('./main');\nexports.b = 1;")];

        let diagnostics = run_no_cycle(&files, "const b = require('./b');");

        assert_eq!(messages(&diagnostics), vec!["Dependency cycle detected."]);
    }

    #[test]
    fn type_only_imports_are_not_followed() {
        let files = [(
            "/project/src/b.ts",
            "import type { Main } from './main.js';\nexport const b = 1;",
        )];

        assert!(run_no_cycle(&files, "import { b } from './b';").is_empty());
    }

    #[test]
    fn self_import_is_not_a_cycle() {
        assert!(run_no_cycle(&[], "import './main.js';").is_empty());
    }
}
