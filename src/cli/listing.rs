use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use crate::cli::commands::{IssuesArgs, OutputArgs, StoriesArgs};
use crate::cli::render::{Overview, Terminal};
use crate::config::KycConfig;
use crate::errors::KycError;
use crate::models::{Issue, IssueCategory, IssueState, Story};
use crate::repository::Repository;
use crate::resource::{
    render, AsyncResource, ContainerMessages, Emptiness, FetchError, FetchStatus, StateRenderer,
};

fn parse_filter<T>(value: Option<&str>) -> Result<Option<T>, KycError>
where
    T: std::str::FromStr<Err = String>,
{
    value.map(str::parse).transpose().map_err(KycError::Validation)
}

/// Load `resource` once and print the settled state.
///
/// The loading line goes to stderr so that stdout only carries the result.
async fn present<T>(
    resource: &AsyncResource<T>,
    messages: &ContainerMessages,
    output: &OutputArgs,
    quiet: bool,
) -> Result<(), KycError>
where
    T: Emptiness + Clone + Send + Sync + Serialize + 'static,
    Terminal: StateRenderer<T, Output = String>,
{
    let pending = resource.load();
    if !quiet && !output.json {
        if let Some(line) = render(&resource.snapshot(), &Terminal, messages) {
            eprintln!("{}", line);
        }
    }
    pending.await;

    let snapshot = resource.snapshot();
    if snapshot.status == FetchStatus::Error {
        let message = snapshot
            .error
            .map(|e| e.message().to_string())
            .unwrap_or_else(|| FetchError::UNKNOWN.to_string());
        return Err(KycError::Fetch(message));
    }

    if output.json {
        let data = snapshot.data.map(|d| serde_json::to_value(d)).transpose()?;
        println!("{}", serde_json::to_string_pretty(&data.unwrap_or(json!(null)))?);
    } else if let Some(out) = render(&snapshot, &Terminal, messages) {
        println!("{}", out);
    }
    Ok(())
}

async fn open(config: &KycConfig) -> Result<Arc<Repository>, KycError> {
    Ok(Arc::new(Repository::from_config(config).await?))
}

pub async fn handle_issues(args: IssuesArgs, config: &KycConfig, quiet: bool) -> Result<(), KycError> {
    let category: Option<IssueCategory> = parse_filter(args.category.as_deref())?;
    let state: Option<IssueState> = parse_filter(args.state.as_deref())?;
    let company = args.company;
    let repo = open(config).await?;

    let source = move || {
        let repo = Arc::clone(&repo);
        async move {
            let issues: Vec<Issue> = repo
                .issues()?
                .into_iter()
                .filter(|i| category.map_or(true, |c| i.category == c))
                .filter(|i| company.map_or(true, |c| i.company_id == c))
                .filter(|i| state.map_or(true, |s| i.state == s))
                .collect();
            Ok::<_, FetchError>(issues)
        }
    };

    let resource = AsyncResource::with_options(source, config.resource_options());
    let messages = ContainerMessages {
        loading: "Loading issues...".into(),
        empty: "No issues match the given filters".into(),
        ..Default::default()
    };
    present(&resource, &messages, &args.output, quiet).await
}

pub async fn handle_stats(args: OutputArgs, config: &KycConfig, quiet: bool) -> Result<(), KycError> {
    let repo = open(config).await?;

    let source = move || {
        let repo = Arc::clone(&repo);
        async move {
            Ok::<_, FetchError>(Overview {
                statistics: repo.statistics(),
                categories: repo.categories().to_vec(),
            })
        }
    };

    let resource = AsyncResource::with_options(source, config.resource_options());
    let messages = ContainerMessages {
        loading: "Computing statistics...".into(),
        ..Default::default()
    };
    present(&resource, &messages, &args, quiet).await
}

pub async fn handle_stories(args: StoriesArgs, config: &KycConfig, quiet: bool) -> Result<(), KycError> {
    let category: Option<IssueCategory> = parse_filter(args.category.as_deref())?;
    let repo = open(config).await?;

    if let Some(story_id) = args.story {
        if repo.get_story(story_id).is_none() {
            return Err(KycError::NotFound(format!("Story {} not found", story_id)));
        }
        let source = move || {
            let repo = Arc::clone(&repo);
            async move { Ok::<_, FetchError>(repo.issues_for_story(story_id)?) }
        };
        let resource = AsyncResource::with_options(source, config.resource_options());
        let messages = ContainerMessages {
            empty: format!("Story {} has no issues", story_id),
            ..Default::default()
        };
        return present(&resource, &messages, &args.output, quiet).await;
    }

    let source = move || {
        let repo = Arc::clone(&repo);
        async move {
            let stories: Vec<Story> = match category {
                Some(c) => repo.stories_by_category(c).into_iter().cloned().collect(),
                None => repo.stories().to_vec(),
            };
            Ok::<_, FetchError>(stories)
        }
    };
    let resource = AsyncResource::with_options(source, config.resource_options());
    let messages = ContainerMessages {
        loading: "Loading stories...".into(),
        ..Default::default()
    };
    present(&resource, &messages, &args.output, quiet).await
}
