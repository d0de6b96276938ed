//! Implementation of the `reforge templates` command.

use tracing::instrument;

use reforge_core::{
    application::{CatalogService, TemplateQuery},
    domain::Template,
};

use crate::{
    cli::{ListFormat, TemplatesArgs},
    commands::open_catalog,
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

#[instrument(skip_all)]
pub fn execute(args: TemplatesArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let catalog = CatalogService::new(open_catalog(&config.catalog)?);
    let templates = catalog.list(&query(&args))?;

    if output.is_json() {
        output.json(&templates)?;
        return Ok(());
    }

    match args.format {
        ListFormat::Table => {
            if templates.is_empty() {
                output.info("No templates match")?;
                return Ok(());
            }
            output.header(&format!("{} template(s):", templates.len()))?;
            for template in &templates {
                output.print(&format!(
                    "  {:<32} {:<22} {:<14} score {:>5.1}  used {:>3}  {}",
                    template.name,
                    template.category,
                    template.kind,
                    template.effectiveness_score,
                    template.usage_count,
                    last_used(template)
                ))?;
            }
        }
        ListFormat::List => {
            for template in &templates {
                output.print(&template.name)?;
            }
        }
        ListFormat::Csv => {
            output.print("id,name,category,kind,effectiveness,usage_count,last_used")?;
            for template in &templates {
                output.print(&format!(
                    "{},{},{},{},{:.1},{},{}",
                    template.id,
                    template.name,
                    template.category,
                    template.kind,
                    template.effectiveness_score,
                    template.usage_count,
                    last_used(template)
                ))?;
            }
        }
    }

    Ok(())
}

fn query(args: &TemplatesArgs) -> TemplateQuery {
    let mut query = TemplateQuery::all();
    if let Some(category) = args.category {
        query = query.category(category);
    }
    if let Some(environment) = &args.environment {
        query = query.environment(environment.clone());
    }
    if let Some(prefix) = &args.prefix {
        query = query.name_prefix(prefix.clone());
    }
    query
}

fn last_used(template: &Template) -> String {
    template
        .last_used
        .map(|at| at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
        .unwrap_or_else(|| "never".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reforge_core::domain::{ArtifactKind, Category};

    fn args() -> TemplatesArgs {
        TemplatesArgs {
            category: Some(Category::Database),
            environment: None,
            prefix: Some("db_".into()),
            format: ListFormat::Table,
        }
    }

    #[test]
    fn query_carries_every_filter() {
        let query = query(&args());
        assert_eq!(query.category, Some(Category::Database));
        assert_eq!(query.name_prefix.as_deref(), Some("db_"));
        assert_eq!(query.environment, None);
    }

    #[test]
    fn unused_templates_say_never() {
        let template = Template::builder()
            .name("db_sync")
            .kind(ArtifactKind::Script)
            .content("x = 1\n")
            .build()
            .unwrap();
        assert_eq!(last_used(&template), "never");
    }
}
