//! Command handlers. Each runs against one `SessionContext`.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use folio_core::guard::EdgeDecision;
use folio_core::utils::{format_date, format_optional, truncate};
use folio_core::{
    AuthEvent, AuthListener, Config, ImageUpload, Project, ProjectForm, RegisterForm,
    SessionContext,
};

use crate::args::{Command, ProjectFields};

/// Maximum description length in list output
const LIST_DESCRIPTION_WIDTH: usize = 60;

/// Tells the user when the API rejects the stored credential
pub struct ExpiryNotice;

impl AuthListener for ExpiryNotice {
    fn on_auth_event(&self, event: &AuthEvent) {
        match event {
            AuthEvent::Unauthenticated { .. } => {
                eprintln!("Session expired. Please log in again.");
            }
        }
    }
}

pub async fn run(ctx: &SessionContext, config: &mut Config, command: Command) -> Result<()> {
    let notice = Arc::new(ExpiryNotice);
    ctx.api().events().subscribe(&notice);

    match command {
        Command::Login { email } => login(ctx, config, email).await,
        Command::Logout => logout(ctx).await,
        Command::WhoAmI => whoami(ctx).await,
        Command::Register => register(ctx).await,
        Command::List { filter } => list(ctx, filter.as_deref()).await,
        Command::Show { id } => show(ctx, &id).await,
        Command::Create(fields) => create(ctx, fields).await,
        Command::Update { id, fields } => update(ctx, &id, fields).await,
        Command::Delete { id } => delete(ctx, &id).await,
    }
}

/// Enter a protected route, failing if the edge check turns us away
fn enter(ctx: &SessionContext, path: &str) -> Result<()> {
    match ctx.navigate(path) {
        EdgeDecision::Next => Ok(()),
        EdgeDecision::Redirect(_) => bail!("Not logged in. Run `folio login` first."),
    }
}

fn project_route(ctx: &SessionContext, id: &str) -> String {
    format!("{}/{}", ctx.guard().home_route().trim_end_matches('/'), id)
}

fn prompt(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(d) => print!("{} [{}]: ", label, d),
        None => print!("{}: ", label),
    }
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let line = line.trim();
    Ok(match default {
        Some(d) if line.is_empty() => d.to_string(),
        _ => line.to_string(),
    })
}

fn prompt_password(label: &str) -> Result<String> {
    rpassword::prompt_password(format!("{}: ", label)).context("Failed to read password")
}

async fn login(ctx: &SessionContext, config: &mut Config, email: Option<String>) -> Result<()> {
    let email = match email {
        Some(e) => e,
        None => prompt("Email", config.last_email.as_deref())?,
    };
    if email.is_empty() {
        bail!("An email address is required");
    }
    let password = prompt_password("Password")?;

    ctx.login(&email, &password).await?;

    config.last_email = Some(email);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    match ctx.session().identity() {
        Some(identity) => println!("Logged in as {} <{}>", identity.name, identity.email),
        None => println!("Logged in"),
    }
    Ok(())
}

async fn logout(ctx: &SessionContext) -> Result<()> {
    match ctx.logout().await {
        Ok(()) => println!("Logged out"),
        Err(e) => {
            warn!(error = %e, "Logout call failed");
            println!("Logged out locally ({})", e);
        }
    }
    Ok(())
}

async fn whoami(ctx: &SessionContext) -> Result<()> {
    match ctx.bootstrap().await {
        Some(identity) => {
            println!("{} <{}>", identity.name, identity.email);
            println!("Member since {}", format_date(&identity.created_at));
        }
        None => println!("Not logged in"),
    }
    Ok(())
}

async fn register(ctx: &SessionContext) -> Result<()> {
    let form = RegisterForm {
        name: prompt("Name", None)?,
        email: prompt("Email", None)?,
        password: prompt_password("Password")?,
        confirm: prompt_password("Confirm password")?,
    };

    ctx.register(&form).await?;
    println!("Account created. Run `folio login {}` to log in.", form.email);
    Ok(())
}

async fn list(ctx: &SessionContext, filter: Option<&str>) -> Result<()> {
    enter(ctx, ctx.guard().home_route())?;
    ctx.projects().fetch_all().await?;
    ctx.projects().set_filter(filter.unwrap_or_default());

    let projects = ctx.projects().filtered();
    if projects.is_empty() {
        println!("No projects found");
        return Ok(());
    }
    for project in &projects {
        let description = truncate(
            &format_optional(project.description.as_deref(), "-"),
            LIST_DESCRIPTION_WIDTH,
        );
        println!("{}  {}  {}", project.id, project.title, description);
        if !project.technologies.is_empty() {
            println!("    [{}]", project.technologies.join(", "));
        }
    }
    Ok(())
}

fn print_project(project: &Project) {
    println!("{}", project.title);
    println!("  id:           {}", project.id);
    println!("  description:  {}", format_optional(project.description.as_deref(), "-"));
    println!("  url:          {}", format_optional(project.url.as_deref(), "-"));
    println!("  technologies: {}", project.technologies.join(", "));
    println!(
        "  image:        {}",
        format_optional(project.image.as_ref().map(|i| i.url.as_str()), "-")
    );
    println!("  created:      {}", format_date(&project.created_at));
    println!("  updated:      {}", format_date(&project.updated_at));
}

async fn show(ctx: &SessionContext, id: &str) -> Result<()> {
    enter(ctx, &project_route(ctx, id))?;
    let project = ctx.projects().get(id).await?;
    print_project(&project);
    Ok(())
}

/// Apply command-line fields over a form
fn apply_fields(form: &mut ProjectForm, fields: ProjectFields) -> Result<()> {
    if let Some(title) = fields.title {
        form.title = title;
    }
    if let Some(description) = fields.description {
        form.description = description;
    }
    if let Some(url) = fields.url {
        form.url = url;
    }
    if !fields.technologies.is_empty() {
        for existing in form.technologies().to_vec() {
            form.remove_technology(&existing);
        }
        for tech in &fields.technologies {
            form.add_technology(tech);
        }
    }
    if let Some(path) = fields.image {
        form.image = Some(ImageUpload::from_path(&path)?);
    }
    form.remove_image = fields.remove_image;
    Ok(())
}

async fn create(ctx: &SessionContext, fields: ProjectFields) -> Result<()> {
    if fields.remove_image {
        bail!("--remove-image only applies to update");
    }
    enter(ctx, ctx.guard().home_route())?;
    let mut form = ProjectForm::default();
    apply_fields(&mut form, fields)?;

    let project = ctx.projects().create(&form).await?;
    info!(id = %project.id, "Created project");
    println!("Created project {}", project.id);
    Ok(())
}

async fn update(ctx: &SessionContext, id: &str, fields: ProjectFields) -> Result<()> {
    enter(ctx, &project_route(ctx, id))?;
    let current = ctx.projects().get(id).await?;
    let mut form = ProjectForm::from_project(&current);
    apply_fields(&mut form, fields)?;

    let project = ctx.projects().update(id, &form).await?;
    println!("Updated project {}", project.id);
    Ok(())
}

async fn delete(ctx: &SessionContext, id: &str) -> Result<()> {
    enter(ctx, &project_route(ctx, id))?;
    ctx.projects().delete(id).await?;
    println!("Deleted project {}", id);
    Ok(())
}
