//! Todo commands - list, show, add, edit, done, delete.

use anyhow::Result;
use clap::{Args, ValueEnum};
use console::{Style, style};
use todo_client::{
    CreateTodoRequest, ListTodosQuery, OrderBy, SortOrder, TodoItem, UpdateTodoRequest,
};

use super::Context;

/// Sortable columns.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum OrderArg {
    Created,
    Updated,
}

impl From<OrderArg> for OrderBy {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Created => OrderBy::CreatedAt,
            OrderArg::Updated => OrderBy::UpdatedAt,
        }
    }
}

/// Sort direction.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum SortArg {
    Asc,
    Desc,
}

impl From<SortArg> for SortOrder {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Asc => SortOrder::Asc,
            SortArg::Desc => SortOrder::Desc,
        }
    }
}

/// Arguments for `todo list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Page number (from 1)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub page: Option<u32>,

    /// Todos per page
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub size: Option<u32>,

    /// Only todos whose title contains this text
    #[arg(short, long)]
    pub keyword: Option<String>,

    /// Column to sort by
    #[arg(long, value_enum)]
    pub order_by: Option<OrderArg>,

    /// Sort direction
    #[arg(long, value_enum)]
    pub sort: Option<SortArg>,
}

/// Arguments for `todo show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Todo ID
    pub id: u64,
}

/// Arguments for `todo add`.
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Title
    pub title: String,

    /// Body text
    #[arg(short, long)]
    pub content: String,

    /// Tag (repeatable)
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,

    /// Image URL
    #[arg(long)]
    pub image: Option<String>,

    /// Create the todo already done
    #[arg(long)]
    pub done: bool,
}

/// Arguments for `todo edit`.
#[derive(Args, Debug)]
pub struct EditArgs {
    /// Todo ID
    pub id: u64,

    /// New title
    #[arg(long)]
    pub title: Option<String>,

    /// New body text
    #[arg(short, long)]
    pub content: Option<String>,

    /// Replace tags (repeatable)
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,

    /// New image URL
    #[arg(long)]
    pub image: Option<String>,

    /// Mark as done
    #[arg(long, conflicts_with = "undone")]
    pub done: bool,

    /// Mark as not done
    #[arg(long)]
    pub undone: bool,
}

/// Arguments for `todo done`.
#[derive(Args, Debug)]
pub struct DoneArgs {
    /// Todo ID
    pub id: u64,

    /// Mark as not done instead
    #[arg(long)]
    pub undo: bool,
}

/// Arguments for `todo delete`.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Todo IDs
    #[arg(required = true, num_args = 1..)]
    pub ids: Vec<u64>,
}

/// Run `todo list`.
pub async fn list(args: ListArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let query = ListTodosQuery {
        page: args.page,
        size: args.size,
        keyword: args.keyword,
        order_by: args.order_by.map(Into::into),
        sort: args.sort.map(Into::into),
    };
    let page_number = query.page.unwrap_or(1);

    let page = client.todos().list(query).await?;

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&page.list)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    println!("{}", style("Todos").bold());
    println!("{}", dim.apply_to("─".repeat(50)));

    if page.list.is_empty() {
        println!("{}", dim.apply_to("No todos found"));
        return Ok(());
    }

    for todo in &page.list {
        println!("{}", summary_line(todo));
    }

    if let Some(total) = page.total_count {
        println!();
        println!(
            "{}",
            dim.apply_to(format!(
                "Page {} · {} shown of {}",
                page_number,
                page.list.len(),
                total
            ))
        );
    }

    Ok(())
}

/// Run `todo show`.
pub async fn show(args: ShowArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let todo = client.todos().detail(args.id).await?;

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&todo)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    println!("{}", summary_line(&todo));
    println!("{}", dim.apply_to("─".repeat(50)));
    if !todo.content.is_empty() {
        println!("{}", todo.content);
        println!();
    }
    if let Some(image) = &todo.image {
        println!("{} {}", dim.apply_to("Image:  "), image);
    }
    println!(
        "{} {}",
        dim.apply_to("Created:"),
        todo.created_at.format("%Y-%m-%d %H:%M")
    );
    println!(
        "{} {}",
        dim.apply_to("Updated:"),
        todo.updated_at.format("%Y-%m-%d %H:%M")
    );

    Ok(())
}

/// Run `todo add`.
pub async fn add(args: AddArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let request = CreateTodoRequest {
        title: args.title,
        image: args.image,
        content: args.content,
        completed: args.done.then_some(true),
        tags: (!args.tags.is_empty()).then_some(args.tags),
    };

    let id = client.todos().create(request).await?;

    if ctx.json_output {
        println!("{}", serde_json::json!({ "id": id }));
    } else {
        let green = Style::new().green();
        println!("{} Created todo {}", green.apply_to("✓"), id);
    }
    Ok(())
}

/// Run `todo edit`.
pub async fn edit(args: EditArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let completed = match (args.done, args.undone) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };
    let request = UpdateTodoRequest {
        title: args.title,
        image: args.image,
        content: args.content,
        completed,
        tags: (!args.tags.is_empty()).then_some(args.tags),
    };
    if request.is_empty() {
        anyhow::bail!("Nothing to change; pass at least one of --title, --content, --tag, --image, --done, --undone");
    }

    let id = client.todos().update(args.id, request).await?;

    if ctx.json_output {
        println!("{}", serde_json::json!({ "id": id }));
    } else {
        let green = Style::new().green();
        println!("{} Updated todo {}", green.apply_to("✓"), id);
    }
    Ok(())
}

/// Run `todo done`.
pub async fn done(args: DoneArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let id = client.todos().set_completed(args.id, !args.undo).await?;

    if ctx.json_output {
        println!("{}", serde_json::json!({ "id": id, "completed": !args.undo }));
    } else {
        let green = Style::new().green();
        let state = if args.undo { "not done" } else { "done" };
        println!("{} Marked todo {} as {}", green.apply_to("✓"), id, state);
    }
    Ok(())
}

/// Run `todo delete`.
pub async fn delete(args: DeleteArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let deleted = client.todos().delete_many(args.ids).await?;

    if ctx.json_output {
        println!("{}", serde_json::json!({ "deleted": deleted }));
    } else {
        let green = Style::new().green();
        let noun = if deleted == 1 { "todo" } else { "todos" };
        println!("{} Deleted {} {}", green.apply_to("✓"), deleted, noun);
    }
    Ok(())
}

fn summary_line(todo: &TodoItem) -> String {
    let dim = Style::new().dim();
    let marker = if todo.completed {
        Style::new().green().apply_to("✓").to_string()
    } else {
        dim.apply_to("○").to_string()
    };
    let mut line = format!(
        "{} {} {}",
        dim.apply_to(format!("[{:>4}]", todo.id)),
        marker,
        truncate(&todo.title, 60)
    );
    if !todo.tags.is_empty() {
        line.push_str(&format!(
            " {}",
            Style::new().cyan().apply_to(format!("#{}", todo.tags.join(" #")))
        ));
    }
    line
}

fn truncate(s: &str, max_chars: usize) -> String {
    let s = s.replace('\n', " ");
    if s.chars().count() <= max_chars {
        s
    } else {
        let cut: String = s.chars().take(max_chars - 3).collect();
        format!("{}...", cut)
    }
}
