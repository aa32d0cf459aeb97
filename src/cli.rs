//! Subcommand definitions and dispatch (spec.md §6/§7 external surface,
//! SPEC_FULL.md §A). The hook subcommands are hidden from `--help` — they
//! are invoked by the scripts `install-hooks` writes, not typed by a user.

use crate::gateway::Gateway;
use crate::hooks;
use crate::manifest::{display_name, Manifest};
use crate::work_period;
use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "prompt-story", version, about = "Attaches local LLM coding-session transcripts to the commits they influenced")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write the five hook scripts into .git/hooks (or core.hooksPath).
    InstallHooks {
        /// Overwrite existing hook scripts.
        #[arg(long)]
        force: bool,
    },
    /// Print the work window the oracle would compute for the next commit.
    Explain {
        /// Compute the window as if amending HEAD.
        #[arg(long)]
        amend: bool,
    },
    /// Print the manifest attached to a commit.
    Show {
        /// Commit-ish to inspect (defaults to HEAD).
        #[arg(default_value = "HEAD")]
        commit: String,
    },
    /// Summarize sessions captured across a commit range.
    Review {
        /// Revision range, e.g. `origin/main..HEAD`.
        range: String,
    },
    /// Force-push the prompt-story references to a remote.
    Push {
        #[arg(default_value = "origin")]
        remote: String,
    },

    #[command(name = "prepare-commit-msg", hide = true)]
    PrepareCommitMsg {
        message_file: PathBuf,
        commit_source: Option<String>,
        #[arg(allow_hyphen_values = true)]
        commit_sha: Option<String>,
    },
    #[command(name = "post-commit", hide = true)]
    PostCommit,
    #[command(name = "pre-push", hide = true)]
    PrePush { remote_name: String, remote_url: String },
    #[command(name = "post-rewrite", hide = true)]
    PostRewrite { rewrite_kind: String },
}

fn read_stdin() -> String {
    let mut buf = String::new();
    let _ = io::stdin().read_to_string(&mut buf);
    buf
}

/// Run the command against the repository containing `cwd`. Hook variants
/// never return an error — they degrade internally per spec.md §6/§7 and
/// this always returns `Ok(())` for them; the explicit commands propagate
/// failures for `main` to report and exit non-zero on.
pub fn run(cli: Cli, cwd: &std::path::Path) -> Result<()> {
    match cli.command {
        Command::InstallHooks { force } => run_install_hooks(cwd, force),
        Command::Explain { amend } => run_explain(cwd, amend),
        Command::Show { commit } => run_show(cwd, &commit),
        Command::Review { range } => run_review(cwd, &range),
        Command::Push { remote } => run_push(cwd, &remote),

        Command::PrepareCommitMsg { message_file, commit_source, .. } => {
            let is_amend = matches!(commit_source.as_deref(), Some("commit") | Some("squash"));
            hooks::prepare_commit_msg(cwd, &message_file, is_amend);
            Ok(())
        }
        Command::PostCommit => {
            hooks::post_commit(cwd);
            Ok(())
        }
        Command::PrePush { remote_name, .. } => {
            hooks::pre_push(cwd, &remote_name);
            Ok(())
        }
        Command::PostRewrite { .. } => {
            let pairs = hooks::parse_rewrite_pairs(&read_stdin());
            hooks::post_rewrite(cwd, &pairs);
            Ok(())
        }
    }
}

const HOOK_NAMES: &[&str] = &["prepare-commit-msg", "post-commit", "pre-push", "post-rewrite"];

fn hook_script(hook: &str) -> String {
    format!(
        "#!/bin/sh\n# Installed by `prompt-story install-hooks`.\nexec prompt-story {hook} \"$@\"\n"
    )
}

fn run_install_hooks(cwd: &std::path::Path, force: bool) -> Result<()> {
    let gateway = Gateway::discover(cwd).context("not inside a git repository")?;
    let hooks_dir = gateway.git_dir().join("hooks");
    std::fs::create_dir_all(&hooks_dir).context("creating hooks directory")?;

    for hook in HOOK_NAMES {
        let path = hooks_dir.join(hook);
        if path.exists() && !force {
            println!("skipping existing {hook} hook (use --force to overwrite)");
            continue;
        }
        std::fs::write(&path, hook_script(hook)).with_context(|| format!("writing {hook} hook"))?;
        set_executable(&path)?;
        println!("installed {hook} hook");
    }
    Ok(())
}

#[cfg(unix)]
fn set_executable(path: &std::path::Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o111);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_executable(_path: &std::path::Path) -> Result<()> {
    Ok(())
}

fn run_explain(cwd: &std::path::Path, amend: bool) -> Result<()> {
    let gateway = Gateway::discover(cwd).context("not inside a git repository")?;
    let period = work_period::compute(&gateway, amend, Utc::now()).context("computing work window")?;
    println!("start:       {}", period.start.to_rfc3339());
    println!("end:         {}", period.end.to_rfc3339());
    println!("explanation: {}", period.explanation);
    Ok(())
}

fn run_show(cwd: &std::path::Path, commit: &str) -> Result<()> {
    let gateway = Gateway::discover(cwd).context("not inside a git repository")?;
    let oid = gateway.rev_parse(commit).with_context(|| format!("resolving {commit}"))?;
    let Some(text) = gateway.notes_show("refs/notes/prompt-story", oid).context("reading note")? else {
        println!("{commit}: no prompt-story note");
        return Ok(());
    };
    let manifest = Manifest::parse(&text).context("parsing manifest note")?;

    println!("{commit} — version {} — work started {}", manifest.version, manifest.start_work.to_rfc3339());
    let transcripts_ref = "refs/notes/prompt-story-transcripts";
    let root = gateway.show_ref(transcripts_ref).unwrap_or(None);
    for session in &manifest.sessions {
        let present = blob_present(&gateway, root, &session.path);
        let status = if present { "present" } else { "missing" };
        println!(
            "  [{}] {} — {} ({status}) created {} modified {}",
            display_name(&session.tool),
            session.id,
            session.path,
            session.created.to_rfc3339(),
            session.modified.to_rfc3339(),
        );
    }
    Ok(())
}

fn blob_present(gateway: &Gateway, root: Option<git2::Oid>, path: &str) -> bool {
    let Some((tool, name)) = path.split_once('/') else {
        return false;
    };
    let Ok(root_entries) = gateway.ls_tree(root) else {
        return false;
    };
    let Some(subtree) = root_entries.iter().find(|e| e.name == tool) else {
        return false;
    };
    let Ok(entries) = gateway.ls_tree(Some(subtree.oid)) else {
        return false;
    };
    entries.iter().any(|e| e.name == name)
}

fn run_review(cwd: &std::path::Path, range: &str) -> Result<()> {
    let gateway = Gateway::discover(cwd).context("not inside a git repository")?;
    let oids = gateway.rev_list(range).with_context(|| format!("walking {range}"))?;
    for oid in oids {
        let full = oid.to_string();
        let short = full[..7.min(full.len())].to_string();
        match gateway.notes_show("refs/notes/prompt-story", oid).ok().flatten() {
            Some(text) => match Manifest::parse(&text) {
                Ok(m) if !m.sessions.is_empty() => {
                    let names = m.display_names().join(", ");
                    println!("{short}  {names} ({} session{})", m.sessions.len(), if m.sessions.len() == 1 { "" } else { "s" });
                }
                _ => println!("{short}  none"),
            },
            None => println!("{short}  none"),
        }
    }
    Ok(())
}

fn run_push(cwd: &std::path::Path, remote: &str) -> Result<()> {
    let gateway = Gateway::discover(cwd).context("not inside a git repository")?;
    let config = crate::config::Config::load_or_default(gateway.workdir()?);
    let pushed = crate::push_sync::sync(&gateway, remote, &config.notes_ref, &config.transcripts_ref)
        .context("pushing prompt-story references")?;
    if pushed {
        println!("pushed prompt-story references to {remote}");
    } else {
        println!("nothing to push");
    }
    Ok(())
}
