//! Parser for the console reports printed by the build tool's `dependencies`
//! and `projects` tasks.
//!
//! Tree lines are indented in 5-column steps (`|    ` or five spaces) and
//! end in a `+--- ` or `\--- ` branch marker.

use lazy_static::lazy_static;
use regex::Regex;

use super::raw::{ConfigurationBlock, DependencyReport, LineNode, ProjectOutline, Subproject};

lazy_static! {
    static ref PROJECT_HEADER: Regex =
        Regex::new(r"^(?:Root project|Project) '([^']*)'").unwrap();
    static ref CONFIGURATION_HEADER: Regex =
        Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)(?: - (.+))?$").unwrap();
    static ref TREE_LINE: Regex = Regex::new(r"^((?:\|    |     )*)[+\\]--- (.*)$").unwrap();
    static ref CHILD_PROJECT: Regex = Regex::new(r"^Project '([^']+)'").unwrap();
    static ref COORDINATES: Regex =
        Regex::new(r"^([^:\s]+):([^:\s]+)(?::(\S+))?(?: -> (\S+))?").unwrap();
}

const NO_DEPENDENCIES: &str = "No dependencies";

#[derive(Default)]
struct ReportBuilder {
    report: DependencyReport,
    project: Option<Subproject>,
    configuration: Option<ConfigurationBlock>,
    lines: Vec<(usize, String)>,
}

impl ReportBuilder {
    fn close_configuration(&mut self) {
        if let Some(mut block) = self.configuration.take() {
            block.nodes = build_forest(&std::mem::take(&mut self.lines));
            self.project
                .get_or_insert_with(Subproject::default)
                .configurations
                .push(block);
        }
        self.lines.clear();
    }

    fn close_project(&mut self) {
        self.close_configuration();
        if let Some(project) = self.project.take() {
            self.report.projects.push(project);
        }
    }

    fn finish(mut self) -> DependencyReport {
        self.close_project();
        self.report
    }
}

/// Parses the console output of one `dependencies` invocation.
pub fn parse_dependency_report(text: &str) -> DependencyReport {
    let mut builder = ReportBuilder::default();

    for raw in text.lines() {
        let line = raw.trim_end();

        if line.is_empty() {
            builder.close_configuration();
            continue;
        }

        if let Some(caps) = PROJECT_HEADER.captures(line) {
            builder.close_project();
            builder.project = Some(Subproject {
                name: caps[1].trim_start_matches(':').to_string(),
                configurations: Vec::new(),
            });
            continue;
        }

        if builder.configuration.is_some() {
            if let Some(caps) = TREE_LINE.captures(line) {
                let depth = caps[1].len() / 5;
                builder.lines.push((depth, caps[2].trim().to_string()));
            } else if line != NO_DEPENDENCIES {
                tracing::trace!(line, "unexpected line inside configuration block");
            }
            continue;
        }

        if let Some(caps) = CONFIGURATION_HEADER.captures(line) {
            let description = caps.get(2).map(|m| m.as_str().trim().to_string());
            if builder.project.is_none() && description.is_none() {
                continue;
            }
            builder.configuration = Some(ConfigurationBlock {
                name: caps[1].to_string(),
                description,
                nodes: Vec::new(),
            });
        }
    }

    builder.finish()
}

/// Parses the console output of the `projects` task. Only direct children of
/// the root project are listed.
pub fn parse_project_outline(text: &str) -> ProjectOutline {
    let mut outline = ProjectOutline::default();
    let mut seen_root = false;

    for raw in text.lines() {
        let line = raw.trim_end();
        if !seen_root {
            if let Some(caps) = PROJECT_HEADER.captures(line) {
                outline.name = caps[1].trim_start_matches(':').to_string();
                seen_root = true;
            }
            continue;
        }
        let Some(caps) = TREE_LINE.captures(line) else {
            continue;
        };
        if !caps[1].is_empty() {
            continue;
        }
        if let Some(child) = CHILD_PROJECT.captures(&caps[2]) {
            let name = child[1].trim_start_matches(':').to_string();
            if !outline.children.contains(&name) {
                outline.children.push(name);
            }
        }
    }

    outline
}

/// Splits a dependency label such as `com.x:y:1.0 -> 1.2 (c)` into
/// group, artifact id and the resolved version.
pub fn parse_coordinates(label: &str) -> (Option<String>, Option<String>, Option<String>) {
    if label.starts_with("project ") {
        return (None, None, None);
    }
    match COORDINATES.captures(label) {
        Some(caps) => {
            let version = caps
                .get(4)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str().to_string());
            (Some(caps[1].to_string()), Some(caps[2].to_string()), version)
        }
        None => (None, None, None),
    }
}

fn build_forest(lines: &[(usize, String)]) -> Vec<LineNode> {
    fn attach(stack: &mut [LineNode], roots: &mut Vec<LineNode>, node: LineNode) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => roots.push(node),
        }
    }

    let mut roots = Vec::new();
    let mut stack: Vec<LineNode> = Vec::new();

    for (depth, text) in lines {
        // A malformed jump deeper than one level nests under the last open node.
        let depth = (*depth).min(stack.len());
        while stack.len() > depth {
            if let Some(node) = stack.pop() {
                attach(&mut stack, &mut roots, node);
            }
        }
        stack.push(LineNode::new(text.clone()));
    }
    while let Some(node) = stack.pop() {
        attach(&mut stack, &mut roots, node);
    }

    roots
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const REPORT: &str = "\
> Task :app:dependencies

------------------------------------------------------------
Project ':app'
------------------------------------------------------------

annotationProcessor - Annotation processors and their dependencies for source set 'main'.
No dependencies

compileClasspath - Compile classpath for source set 'main'.
+--- com.google.guava:guava:31.1-jre
|    +--- com.google.guava:failureaccess:1.0.1
|    \\--- org.checkerframework:checker-qual:3.12.0
\\--- org.slf4j:slf4j-api:1.7.30 -> 1.7.36

implementation - Implementation only dependencies for source set 'main'. (n)
\\--- com.google.guava:guava:31.1-jre (n)

(*) - Indicates repeated occurrences of a transitive dependency subtree.
(n) - A dependency or dependency configuration that cannot be resolved.

A web-based, searchable dependency report is available by adding the --scan option.

BUILD SUCCESSFUL in 1s
";

    #[test]
    fn parses_project_configurations_and_nesting() {
        let report = parse_dependency_report(REPORT);
        assert_eq!(report.projects.len(), 1);
        let app = &report.projects[0];
        assert_eq!(app.name, "app");

        let names: Vec<&str> = app.configurations.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["annotationProcessor", "compileClasspath", "implementation"]);

        assert!(app.configurations[0].nodes.is_empty());
        let compile = &app.configurations[1];
        assert_eq!(
            compile.nodes,
            vec![
                LineNode::new("com.google.guava:guava:31.1-jre").with_children(vec![
                    LineNode::new("com.google.guava:failureaccess:1.0.1"),
                    LineNode::new("org.checkerframework:checker-qual:3.12.0"),
                ]),
                LineNode::new("org.slf4j:slf4j-api:1.7.30 -> 1.7.36"),
            ]
        );
    }

    #[test]
    fn legend_and_footer_lines_are_not_configurations() {
        let report = parse_dependency_report(REPORT);
        assert_eq!(report.projects[0].configurations.len(), 3);
    }

    #[test]
    fn several_project_headers_yield_several_projects() {
        let text = "Root project 'demo'\n\ncompile - c\n\\--- a:b:1\n\nProject ':lib'\n\ncompile - c\nNo dependencies\n";
        let report = parse_dependency_report(text);
        let names: Vec<&str> = report.projects.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["demo", "lib"]);
        assert_eq!(report.projects[1].configurations[0].nodes.len(), 0);
    }

    #[test]
    fn deep_nesting_and_backtracking() {
        let text = "Root project 'r'\n\nc - d\n+--- a:a:1\n|    \\--- b:b:1\n|         \\--- c:c:1\n\\--- d:d:1\n";
        let nodes = &parse_dependency_report(text).projects[0].configurations[0].nodes;
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].children[0].children[0].text, "c:c:1");
        assert_eq!(nodes[1].text, "d:d:1");
    }

    #[test]
    fn outline_lists_direct_children_only() {
        let text = "\
------------------------------------------------------------
Root project 'demo'
------------------------------------------------------------

Root project 'demo'
+--- Project ':app' - The application
|    \\--- Project ':app:nested'
\\--- Project ':lib'
";
        let outline = parse_project_outline(text);
        assert_eq!(outline.name, "demo");
        assert_eq!(outline.children, vec!["app", "lib"]);
    }

    #[test]
    fn coordinates_prefer_resolved_version() {
        assert_eq!(
            parse_coordinates("org.slf4j:slf4j-api:1.7.30 -> 1.7.36"),
            (
                Some("org.slf4j".into()),
                Some("slf4j-api".into()),
                Some("1.7.36".into())
            )
        );
        assert_eq!(
            parse_coordinates("com.x:y:1.0"),
            (Some("com.x".into()), Some("y".into()), Some("1.0".into()))
        );
        assert_eq!(parse_coordinates("project :lib"), (None, None, None));
    }
}
