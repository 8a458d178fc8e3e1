use iam_model::{Dataset, DatasetStats, ShapeIssue};
use iam_search::{Catalog, FilterSpec, RecordView, Resolved, TagPredicate};
use iam_session::Page;

const DESCRIPTION_WIDTH: usize = 72;

/// One line per record plus a footer describing the window
pub fn render_page(page: &Page<'_>) -> String {
    let mut out = String::new();
    for view in &page.records {
        out.push_str(&render_row(view));
        out.push('\n');
    }
    out.push_str(&format!(
        "-- {} of {} matches ({} actions loaded)",
        page.shown(),
        page.matched,
        page.total
    ));
    if page.has_more {
        out.push_str(", more available");
    }
    out.push_str(" --");
    out
}

pub fn render_row(view: &RecordView<'_>) -> String {
    let action = view.action;
    let mut flags = Vec::new();
    if action.has_request_tag {
        flags.push("request-tag");
    }
    if action.has_resource_tag {
        flags.push("resource-tag");
    }
    if action.has_tag_keys {
        flags.push("tag-keys");
    }
    if action.supports_resource_level_permissions {
        flags.push("resource-level");
    }
    if action.has_dependent_actions() {
        flags.push("dependents");
    }

    let mut row = format!("{:<48} {:<24}", view.id(), action.access_level.as_str());
    if !flags.is_empty() {
        row.push_str(&format!(" [{}]", flags.join(", ")));
    }
    if !action.description.is_empty() {
        row.push_str(&format!(
            "\n    {}",
            truncate_one_line(&action.description, DESCRIPTION_WIDTH)
        ));
    }
    row.trim_end().to_string()
}

/// Active criteria only; `all actions` when nothing is set
pub fn summarize_filter(spec: &FilterSpec) -> String {
    let mut parts = Vec::new();
    if spec.search_active() {
        parts.push(format!("search=\"{}\"", spec.search.trim()));
    }
    if spec.service.is_active() {
        parts.push(format!("service={}", spec.service));
    }
    if spec.access_level.is_active() {
        parts.push(format!("level={}", spec.access_level));
    }
    for predicate in TagPredicate::ALL {
        let state = spec.tri(predicate);
        if state.is_active() {
            parts.push(format!("{}={state}", predicate.as_str()));
        }
    }
    if parts.is_empty() {
        "all actions".to_string()
    } else {
        parts.join(" ")
    }
}

pub fn render_action(catalog: &Catalog, view: &RecordView<'_>) -> String {
    let action = view.action;
    let mut out = String::new();
    out.push_str(&format!("{} ({})\n", view.id(), view.service.display_name()));
    if !action.description.is_empty() {
        out.push_str(&format!("  {}\n", action.description));
    }
    out.push_str(&format!("  Access level: {}\n", action.access_level));
    out.push_str(&format!(
        "  Resource-level permissions: {}\n",
        yes_no(action.supports_resource_level_permissions)
    ));
    out.push_str(&format!(
        "  Tags: request={} resource={} keys={}\n",
        yes_no(action.has_request_tag),
        yes_no(action.has_resource_tag),
        yes_no(action.has_tag_keys)
    ));

    let resources = catalog.resources(view);
    if !resources.is_empty() {
        out.push_str("  Resources:\n");
        for resolved in resources {
            match resolved {
                Resolved::Defined(resource) => {
                    out.push_str(&format!("    {}\n", resource.name));
                    for arn in &resource.arn_formats {
                        out.push_str(&format!("      {arn}\n"));
                    }
                }
                Resolved::Bare(name) => out.push_str(&format!("    {name}\n")),
            }
        }
    }

    let keys = catalog.condition_keys(view);
    if !keys.is_empty() {
        out.push_str("  Condition keys:\n");
        for resolved in keys {
            match resolved {
                Resolved::Defined(key) if !key.types.is_empty() => {
                    out.push_str(&format!("    {} ({})\n", key.name, key.types.join(", ")));
                }
                Resolved::Defined(key) => out.push_str(&format!("    {}\n", key.name)),
                Resolved::Bare(name) => out.push_str(&format!("    {name}\n")),
            }
        }
    }

    let dependents = catalog.dependents(view);
    if !dependents.is_empty() {
        out.push_str("  Dependent actions:\n");
        for link in dependents {
            let marker = if link.target.is_some() { "" } else { " (not in dataset)" };
            out.push_str(&format!("    {}{marker}\n", link.id));
        }
    }

    out.trim_end().to_string()
}

pub fn render_stats(dataset: &Dataset, stats: &DatasetStats, issues: &[ShapeIssue]) -> String {
    let mut out = String::new();
    out.push_str(&format!("Services:               {}\n", stats.services));
    if let Some(declared) = dataset.total_services {
        if declared != stats.services {
            out.push_str(&format!("  (document declares {declared})\n"));
        }
    }
    out.push_str(&format!("Actions:                {}\n", stats.actions));
    out.push_str(&format!(
        "  with description:     {}\n",
        stats.actions_with_description
    ));
    out.push_str(&format!(
        "  with dependents:      {} ({} relationships)\n",
        stats.actions_with_dependents, stats.dependent_relationships
    ));
    out.push_str(&format!("Resource types:         {}\n", stats.resource_types));
    out.push_str(&format!("Condition keys:         {}\n", stats.condition_keys));
    out.push_str("By access level:\n");
    for (level, count) in &stats.by_access_level {
        out.push_str(&format!("  {:<22}{count}\n", level.as_str()));
    }
    if let Some(updated) = &dataset.last_updated {
        out.push_str(&format!("Last updated:           {updated}\n"));
    }
    if !dataset.failed_services.is_empty() {
        out.push_str(&format!(
            "Failed services:        {}\n",
            dataset.failed_services.join(", ")
        ));
    }
    if !issues.is_empty() {
        out.push_str(&format!("Shape issues:           {}\n", issues.len()));
        for issue in issues {
            out.push_str(&format!("  {issue}\n"));
        }
    }
    out.trim_end().to_string()
}

/// One-line dataset summary shown when a browse session starts
pub fn render_header(dataset: &Dataset) -> String {
    let stats = dataset.stats();
    let mut line = format!(
        "IAM reference: {} services, {} actions",
        stats.services, stats.actions
    );
    if let Some(updated) = &dataset.last_updated {
        line.push_str(&format!(", updated {updated}"));
    }
    line.push_str(&format!(", {} failed services", stats.failed_services));
    line
}

pub fn render_services(dataset: &Dataset) -> String {
    let mut out = String::new();
    for service in &dataset.services {
        out.push_str(&format!(
            "{:<28} {:<48} {:>5} actions\n",
            service.service,
            service.display_name(),
            service.actions.len()
        ));
    }
    out.push_str(&format!("-- {} services --", dataset.services.len()));
    out
}

const fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn truncate_one_line(text: &str, max_chars: usize) -> String {
    let line = text.lines().next().unwrap_or_default().trim();
    if line.chars().count() <= max_chars {
        return line.to_string();
    }
    let mut cut: String = line.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
