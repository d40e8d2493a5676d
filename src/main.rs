use anyhow::Result;
use blog_dashboard::actions::DeletionOutcome;
use blog_dashboard::app::App;
use blog_dashboard::models::{ArticleForm, ArticleTarget, CategoryTarget, Config};
use blog_dashboard::prompt::ConsolePrompt;
use blog_dashboard::thumbnail::Thumbnail;
use blog_dashboard::uploader::SubmitOutcome;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "blog-dashboard")]
#[command(about = "Manage articles and categories on the blog dashboard")]
struct CliArgs {
    /// Sign in with this email instead of CMS_EMAIL. The password is read
    /// from CMS_PASSWORD.
    #[arg(long, global = true)]
    email: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Delete an article after confirmation.
    DeleteArticle {
        #[arg(long)]
        slug: String,
        /// Article topic shown in the confirmation.
        #[arg(long)]
        topic: String,
        /// Skip the confirmation prompt.
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Delete a category after confirmation.
    DeleteCategory {
        #[arg(long)]
        pk: String,
        /// Category name shown in the confirmation.
        #[arg(long)]
        name: String,
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Upload an optional thumbnail and submit the article form.
    SubmitArticle {
        /// Category primary key.
        #[arg(long)]
        category: String,
        #[arg(long)]
        topic: String,
        #[arg(long)]
        body: String,
        #[arg(long)]
        posted: bool,
        /// Author primary key.
        #[arg(long)]
        author: Option<String>,
        #[arg(long, value_name = "PATH")]
        thumbnail: Option<PathBuf>,
        /// Update the article with this slug instead of creating one.
        #[arg(long, value_name = "SLUG")]
        update: Option<String>,
    },
}

impl Command {
    fn assume_yes(&self) -> bool {
        match self {
            Command::DeleteArticle { yes, .. } | Command::DeleteCategory { yes, .. } => *yes,
            Command::SubmitArticle { .. } => false,
        }
    }
}

async fn run(app: &App, command: Command) -> blog_dashboard::Result<()> {
    match command {
        Command::DeleteArticle { slug, topic, .. } => {
            match app.delete_article(&ArticleTarget::new(topic, slug)).await? {
                DeletionOutcome::Cancelled => info!("Article deletion cancelled"),
                DeletionOutcome::Deleted { reloaded } => {
                    info!("Article deleted (dashboard reloaded: {})", reloaded)
                }
            }
        }
        Command::DeleteCategory { pk, name, .. } => {
            match app.delete_category(&CategoryTarget::new(pk, name)).await? {
                DeletionOutcome::Cancelled => info!("Category deletion cancelled"),
                DeletionOutcome::Deleted { reloaded } => {
                    info!("Category deleted (dashboard reloaded: {})", reloaded)
                }
            }
        }
        Command::SubmitArticle {
            category,
            topic,
            body,
            posted,
            author,
            thumbnail,
            update,
        } => {
            let mut form = ArticleForm::new(category, topic, body).with_posted(posted);
            if let Some(author) = author {
                form = form.with_author(author);
            }
            if let Some(slug) = update {
                form = form.for_update(slug);
            }

            let thumbnail = match thumbnail {
                Some(path) => Some(Thumbnail::from_path(&path).await?),
                None => None,
            };

            match app.submit_article(form, thumbnail).await? {
                SubmitOutcome::Submitted { thumbnail_url } => match thumbnail_url {
                    Some(url) => info!("Article submitted with thumbnail {}", url),
                    None => info!("Article submitted without thumbnail"),
                },
                SubmitOutcome::Rejected { size } => {
                    info!("Article not submitted: thumbnail is {} bytes", size)
                }
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blog_dashboard=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();
    let prompt = Arc::new(ConsolePrompt::new().with_assume_yes(args.command.assume_yes()));

    let mut config = Config::from_env()?;
    if let Some(email) = args.email {
        config.email = Some(email);
    }

    match App::from_config(&config, prompt).await {
        Ok(app) => match run(&app, args.command).await {
            Ok(()) => Ok(()),
            Err(e) => {
                error!("Dashboard action failed: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            error!("Failed to initialize dashboard: {}", e);
            std::process::exit(1);
        }
    }
}
