//! Built-in `help` command

use crate::io::Style;
use crate::runner::{Command, CommandSpec, Invocation, OptionKind, OptionSpec, Runner};
use colored::Color;
use indexmap::IndexMap;

/// Name the help command is registered under
pub const HELP_COMMAND: &str = "help";

/// Lists the registered commands, or details one of them
#[derive(Debug, Clone)]
pub struct HelpCommand {
    spec: CommandSpec,
    app_name: String,
    usage: String,
}

impl HelpCommand {
    pub fn new(app_name: impl Into<String>, usage: impl Into<String>) -> Self {
        let spec = CommandSpec::new(HELP_COMMAND)
            .description("Show the available commands, or one command's options")
            .option(
                OptionSpec::named("command")
                    .description("Command to describe")
                    .optional(true),
            );

        HelpCommand {
            spec,
            app_name: app_name.into(),
            usage: usage.into(),
        }
    }

    fn list(&self, ctx: &Invocation<'_>) -> anyhow::Result<i32> {
        let runner = ctx.runner();

        let mut header = self.app_name.clone();
        if !self.usage.is_empty() {
            header.push_str(" - ");
            header.push_str(&self.usage);
        }
        ctx.write(format_args!("{}\n\n", header), Style::plain().bold())?;
        ctx.println(format_args!(
            "Usage: {} <command> [options]",
            self.app_name
        ))?;

        if !runner.global_options().is_empty() {
            heading(ctx, "Global options")?;
            let rows: Vec<(String, String)> = runner
                .global_options()
                .iter()
                .map(|o| (o.display_name(), o.get_description().to_string()))
                .collect();
            print_rows(ctx, &rows)?;
        }

        for (group, specs) in grouped(runner) {
            heading(ctx, group.unwrap_or("Commands"))?;
            let rows: Vec<(String, String)> = specs
                .iter()
                .map(|spec| {
                    let mut label = spec.name().to_string();
                    if !spec.get_aliases().is_empty() {
                        label = format!("{} ({})", label, spec.get_aliases().join(", "));
                    }
                    (label, spec.get_description().to_string())
                })
                .collect();
            print_rows(ctx, &rows)?;
        }

        Ok(0)
    }

    fn describe(&self, ctx: &Invocation<'_>, requested: &str) -> anyhow::Result<i32> {
        let runner = ctx.runner();
        let Some(command) = runner
            .resolve(requested)
            .and_then(|name| runner.get_command(name))
        else {
            ctx.error(format_args!("Command '{}' is not supported.", requested))?;
            return Ok(1);
        };
        let spec = command.spec();

        ctx.write(format_args!("{}", spec.name()), Style::plain().bold())?;
        if spec.get_description().is_empty() {
            ctx.println(format_args!(""))?;
        } else {
            ctx.println(format_args!(" - {}", spec.get_description()))?;
        }
        if !spec.get_aliases().is_empty() {
            ctx.println(format_args!("Aliases: {}", spec.get_aliases().join(", ")))?;
        }

        let options = runner.effective_options(spec);
        if !options.is_empty() {
            heading(ctx, "Options")?;
            let rows: Vec<(String, String)> = options
                .iter()
                .map(|o| (o.display_name(), option_details(o)))
                .collect();
            print_rows(ctx, &rows)?;
        }

        Ok(0)
    }
}

impl Command for HelpCommand {
    fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    fn exec(&self, ctx: &mut Invocation<'_>) -> anyhow::Result<i32> {
        match ctx.value("command").map(str::to_string) {
            Some(requested) => self.describe(ctx, &requested),
            None => self.list(ctx),
        }
    }
}

/// Visible commands by group, ungrouped first, in registration order
fn grouped(runner: &Runner) -> IndexMap<Option<&str>, Vec<&CommandSpec>> {
    let mut groups: IndexMap<Option<&str>, Vec<&CommandSpec>> = IndexMap::new();
    groups.insert(None, Vec::new());

    for command in runner.get_commands().values() {
        let spec = command.spec();
        if spec.is_hidden() {
            continue;
        }
        groups.entry(spec.get_group()).or_default().push(spec);
    }

    groups.retain(|_, specs| !specs.is_empty());
    groups
}

fn option_details(option: &OptionSpec) -> String {
    let kind = match option.kind() {
        OptionKind::Positional => "positional",
        OptionKind::Named => "named",
        OptionKind::Flag => "flag",
    };
    let mut details = vec![kind.to_string()];
    details.push(if option.is_optional() { "optional" } else { "required" }.to_string());
    if let Some(default) = option.get_default() {
        details.push(format!("default: {}", default));
    }
    if !option.allowed_values().is_empty() {
        details.push(format!("values: {}", option.allowed_values().join("|")));
    }

    if option.get_description().is_empty() {
        format!("({})", details.join(", "))
    } else {
        format!("{} ({})", option.get_description(), details.join(", "))
    }
}

fn heading(ctx: &Invocation<'_>, title: &str) -> anyhow::Result<()> {
    ctx.write(format_args!("\n{}:\n", title), Style::color(Color::Yellow).bold())?;
    Ok(())
}

fn print_rows(ctx: &Invocation<'_>, rows: &[(String, String)]) -> anyhow::Result<()> {
    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    for (label, text) in rows {
        ctx.println(format_args!("  {:<width$}  {}", label, text, width = width))?;
    }
    Ok(())
}
