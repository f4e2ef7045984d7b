//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::client::Canvas;
use crate::config::ClientConfig;
use crate::pagination::{ErrorPolicy, ItemStream, LinkSet};
use anyhow::Context;
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::io::Write;
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
    config: ClientConfig,
}

impl Runner {
    /// Resolve configuration: file, then environment, then flags
    pub fn new(cli: Cli) -> anyhow::Result<Self> {
        let mut config = match &cli.config {
            Some(path) => ClientConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ClientConfig::default(),
        }
        .apply_env();

        if let Some(url) = &cli.base_url {
            config.base_url = Some(url.clone());
        }
        if let Some(token) = &cli.token {
            config.token = Some(token.clone());
        }
        if let Some(per_page) = cli.per_page {
            config.page_size = per_page;
        }

        Ok(Self { cli, config })
    }

    /// Level for the log subscriber
    pub fn log_level(&self) -> tracing::Level {
        if self.cli.verbose {
            tracing::Level::DEBUG
        } else {
            self.config.log_level.into()
        }
    }

    /// Run the CLI command
    pub async fn run(&self) -> anyhow::Result<()> {
        let options = self.cli.query.clone();
        match &self.cli.command {
            Commands::Links { header } => self.links(header),
            Commands::Courses => {
                let stream = self.canvas()?.courses(options).await;
                self.drain(stream).await
            }
            Commands::Users { course } => {
                let stream = self.canvas()?.course_users(*course, options).await;
                self.drain(stream).await
            }
            Commands::Assignments { course } => {
                let stream = self.canvas()?.course_assignments(*course, options).await;
                self.drain(stream).await
            }
            Commands::Files { folder } => {
                let mut entries = self.canvas()?.folder_entries(*folder, options).await;
                let count = self.emit(&mut entries).await?;
                let (files, folders) = entries.into_inner();
                files.finish().await.context("listing files")?;
                folders.finish().await.context("listing folders")?;
                info!(items = count, "Done");
                Ok(())
            }
        }
    }

    fn canvas(&self) -> anyhow::Result<Canvas> {
        let policy = if self.cli.continue_on_error {
            ErrorPolicy::new(|err| {
                warn!(error = %err, "Skipping failed page");
                Ok(())
            })
        } else {
            ErrorPolicy::stop_on_error()
        };
        let canvas = Canvas::new(&self.config).context("invalid client configuration")?;
        Ok(canvas.with_policy(policy))
    }

    async fn drain<T: Serialize>(&self, mut stream: ItemStream<T>) -> anyhow::Result<()> {
        let count = self.emit(&mut stream).await?;
        let summary = stream.finish().await?;
        info!(
            items = count,
            total_pages = ?summary.total_pages,
            skipped_errors = summary.errors_tolerated,
            "Done"
        );
        Ok(())
    }

    /// Print every item of `stream`, returning how many were printed
    async fn emit<S, T>(&self, stream: &mut S) -> anyhow::Result<usize>
    where
        S: Stream<Item = T> + Unpin,
        T: Serialize,
    {
        let mut count = 0;
        while let Some(item) = stream.next().await {
            let mut out = std::io::stdout().lock();
            self.write_item(&mut out, &item)?;
            count += 1;
        }
        std::io::stdout().flush()?;
        Ok(count)
    }

    fn links(&self, header: &str) -> anyhow::Result<()> {
        let links = LinkSet::parse(header)?;
        self.write_item(&mut std::io::stdout().lock(), &links)?;
        Ok(())
    }

    fn write_item<W: Write, T: Serialize>(&self, out: &mut W, item: &T) -> anyhow::Result<()> {
        match self.cli.format {
            OutputFormat::Json => serde_json::to_writer(&mut *out, item)?,
            OutputFormat::Pretty => serde_json::to_writer_pretty(&mut *out, item)?,
        }
        writeln!(out)?;
        Ok(())
    }
}
