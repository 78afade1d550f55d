// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use colored::Colorize;
use davprobe_discovery::{CollectionInfo, CollectionType, DiscoveryResult, ServiceType};

/// Human readable rendering of a discovery result.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    result: &'a DiscoveryResult,
}

impl<'a> Report<'a> {
    /// Creates a report for `result`.
    #[must_use]
    pub const fn new(result: &'a DiscoveryResult) -> Self {
        Self { result }
    }

    fn fmt_service(&self, f: &mut fmt::Formatter<'_>, service: ServiceType) -> fmt::Result {
        let Some(info) = self.result.service(service) else {
            return writeln!(f, "{} {}", service.to_string().bold(), "not found".dimmed());
        };

        writeln!(f, "{}", service.to_string().bold().green())?;
        match &info.principal {
            Some(principal) => writeln!(f, "  principal  {principal}")?,
            None => writeln!(f, "  principal  {}", "unknown".dimmed())?,
        }
        for home_set in &info.home_sets {
            writeln!(f, "  home set   {home_set}")?;
        }
        for email in &info.emails {
            writeln!(f, "  email      {email}")?;
        }

        if info.collections.is_empty() {
            writeln!(f, "  {}", "no collections".dimmed())?;
        } else {
            writeln!(f, "  collections")?;
            for collection in info.collections.values() {
                fmt_collection(f, collection)?;
            }
        }
        Ok(())
    }
}

fn fmt_collection(f: &mut fmt::Formatter<'_>, collection: &CollectionInfo) -> fmt::Result {
    let name = collection.display_name.as_deref().unwrap_or("(unnamed)");
    write!(f, "    {}  {}", name.cyan(), collection.url)?;

    let mut tags = Vec::new();
    if collection.kind == CollectionType::Calendar {
        if collection.supports_events() {
            tags.push("events");
        }
        if collection.supports_tasks() {
            tags.push("tasks");
        }
    }
    if !collection.write {
        tags.push("read-only");
    }
    if !tags.is_empty() {
        write!(f, "  [{}]", tags.join(", "))?;
    }
    writeln!(f)?;

    if let Some(description) = &collection.description {
        writeln!(f, "      {}", description.dimmed())?;
    }
    Ok(())
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_service(f, ServiceType::CardDav)?;
        self.fmt_service(f, ServiceType::CalDav)?;

        if self.result.is_empty() && self.result.auth_failure_observed {
            writeln!(
                f,
                "{} the server rejected the credentials, check the user name and password",
                "Hint:".yellow()
            )?;
        }

        if !self.result.log.is_empty() {
            writeln!(f)?;
            writeln!(f, "{}", "Log".bold())?;
            for line in &self.result.log {
                writeln!(f, "  {}", line.dimmed())?;
            }
        }
        Ok(())
    }
}
