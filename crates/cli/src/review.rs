//! `census compose` / `census grant`: manager-facing drafts and edit grants.

use std::path::{Path, PathBuf};

use census_recon::{compose, diff, grant_edit, group, ComposeOptions, DirectoryColumns, DraftEmail, Identifier, MergePolicy};

use crate::roster::combined_reference;
use crate::{load_roster, load_rosters, to_json, CliError};

pub struct ComposeArgs {
    pub current: PathBuf,
    pub reference: Vec<PathBuf>,
    pub policy: MergePolicy,
    pub directory: Option<PathBuf>,
    pub report_url: Option<String>,
    pub signature: String,
    pub out_dir: Option<PathBuf>,
    pub id_column: String,
    pub json: bool,
}

pub fn cmd_compose(args: ComposeArgs) -> Result<(), CliError> {
    let identifier = Identifier::new(args.id_column);
    let sets = load_rosters(&args.reference)?;
    let combined = combined_reference(&sets, args.policy, &identifier)?;
    let current = load_roster(&args.current)?;

    // Managers come from the first reference roster unless a directory is given
    let directory = match args.directory {
        Some(ref path) => load_roster(path)?,
        None => sets.into_iter().next().unwrap_or_default(),
    };

    let diffs = diff(&current, &combined, &identifier);
    let groups = group(&diffs, &directory, &identifier, &DirectoryColumns::default());
    let options = ComposeOptions {
        report_url: args.report_url,
        signature: args.signature,
    };
    let drafts = compose(&groups, &options);

    if let Some(ref dir) = args.out_dir {
        write_drafts(dir, &drafts)?;
        eprintln!("wrote {} draft(s) to {}", drafts.len(), dir.display());
    }

    if args.json {
        println!("{}", to_json(&drafts)?);
    } else {
        for draft in &drafts {
            let to = if draft.to_email.is_empty() {
                draft.to_name.clone()
            } else {
                format!("{} <{}>", draft.to_name, draft.to_email)
            };
            println!("{}  ({} employee(s))", to, draft.employee_ids.len());
        }
    }

    eprintln!(
        "{} draft(s) covering {} employee(s) with differences",
        drafts.len(),
        groups.record_count(),
    );
    Ok(())
}

fn write_drafts(dir: &Path, drafts: &[DraftEmail]) -> Result<(), CliError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| CliError::io(format!("cannot create {}: {e}", dir.display())))?;
    for (idx, draft) in drafts.iter().enumerate() {
        let path = dir.join(draft_file_name(idx, &draft.to_name));
        std::fs::write(&path, &draft.body)
            .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
    }
    Ok(())
}

/// `01-jane-doe.html`: 1-based position plus a lowercase slug of the owner.
fn draft_file_name(idx: usize, owner: &str) -> String {
    let mut slug = String::new();
    for ch in owner.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    let slug = if slug.is_empty() { "draft" } else { slug };
    format!("{:02}-{}.html", idx + 1, slug)
}

pub fn cmd_grant(directory: PathBuf, email: String, id_column: String, json: bool) -> Result<(), CliError> {
    let identifier = Identifier::new(id_column);
    let rows = load_roster(&directory)?;
    let grant = grant_edit(&email, &rows, &identifier, &DirectoryColumns::default())
        .map_err(CliError::engine)?;

    if json {
        println!("{}", to_json(&grant)?);
    } else {
        for id in &grant.employee_ids {
            println!("{id}");
        }
    }

    eprintln!(
        "{} <{}> may edit {} employee(s)",
        grant.manager_name,
        grant.manager_email,
        grant.employee_ids.len(),
    );
    Ok(())
}
