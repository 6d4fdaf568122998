//! GitHub platform service implementation

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{
    NewPullRequest, PlatformConfig, PrComment, PrState, PullRequest, PullRequestDetails,
    PullRequestUpdate,
};
use async_trait::async_trait;
use octocrab::Octocrab;
use serde::Deserialize;
use tracing::debug;

const CONVERT_TO_DRAFT: &str = r"
    mutation ConvertPullRequestToDraft($pullRequestId: ID!) {
        convertPullRequestToDraft(input: { pullRequestId: $pullRequestId }) {
            pullRequest { isDraft }
        }
    }
";

const MARK_READY_FOR_REVIEW: &str = r"
    mutation MarkPullRequestReadyForReview($pullRequestId: ID!) {
        markPullRequestReadyForReview(input: { pullRequestId: $pullRequestId }) {
            pullRequest { isDraft }
        }
    }
";

// GraphQL response types for the draft mutations

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct DraftMutationData {
    #[serde(
        rename = "convertPullRequestToDraft",
        alias = "markPullRequestReadyForReview"
    )]
    payload: DraftPayload,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DraftPayload {
    pull_request: GraphQlDraftState,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphQlDraftState {
    is_draft: bool,
}

/// GitHub service using octocrab
pub struct GitHubService {
    client: Octocrab,
    config: PlatformConfig,
}

impl GitHubService {
    /// Create a new GitHub service
    pub fn new(token: &str, owner: String, repo: String, host: Option<String>) -> Result<Self> {
        let mut builder = Octocrab::builder().personal_token(token.to_string());

        if let Some(ref h) = host {
            builder = builder
                .base_uri(format!("https://{h}/api/v3"))
                .map_err(|e| Error::GitHubApi(e.to_string()))?;
        }

        let client = builder
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        Ok(Self {
            client,
            config: PlatformConfig { owner, repo, host },
        })
    }

    /// Flip a PR's draft state through GraphQL
    async fn set_draft(&self, pr_number: u64, node_id: &str, draft: bool) -> Result<bool> {
        debug!(pr_number, draft, "setting PR draft state");
        let query = if draft {
            CONVERT_TO_DRAFT
        } else {
            MARK_READY_FOR_REVIEW
        };

        let response: GraphQlResponse<DraftMutationData> = self
            .client
            .graphql(&serde_json::json!({
                "query": query,
                "variables": { "pullRequestId": node_id }
            }))
            .await
            .map_err(|e| Error::GitHubApi(format!("GraphQL mutation failed: {e}")))?;

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            let messages: Vec<_> = errors.into_iter().map(|e| e.message).collect();
            return Err(Error::GitHubApi(format!(
                "GraphQL error: {}",
                messages.join(", ")
            )));
        }

        let data = response
            .data
            .ok_or_else(|| Error::GitHubApi("No data in GraphQL response".to_string()))?;
        Ok(data.payload.pull_request.is_draft)
    }
}

/// Helper to convert octocrab PR to our `PullRequest` type
fn pr_from_octocrab(pr: &octocrab::models::pulls::PullRequest) -> PullRequest {
    PullRequest {
        number: pr.number,
        html_url: pr
            .html_url
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        base_ref: pr.base.ref_field.clone(),
        head_ref: pr.head.ref_field.clone(),
        head_sha: pr.head.sha.clone(),
        title: pr.title.as_deref().unwrap_or_default().to_string(),
        body: pr.body.clone().unwrap_or_default(),
        node_id: pr.node_id.clone(),
        is_draft: pr.draft.unwrap_or(false),
    }
}

fn is_not_found(err: &octocrab::Error) -> bool {
    matches!(err, octocrab::Error::GitHub { source, .. } if source.status_code.as_u16() == 404)
}

#[async_trait]
impl PlatformService for GitHubService {
    async fn find_existing_pr(&self, head_branch: &str) -> Result<Option<PullRequest>> {
        debug!(head_branch, "finding existing PR");
        let head = format!("{}:{}", &self.config.owner, head_branch);

        let prs = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .list()
            .head(head)
            .state(octocrab::params::State::Open)
            .per_page(10)
            .send()
            .await?;

        let mut matching: Vec<PullRequest> = prs
            .items
            .iter()
            .filter(|pr| pr.head.ref_field == head_branch)
            .map(pr_from_octocrab)
            .collect();

        match matching.len() {
            0 => {
                debug!(head_branch, "no existing PR found");
                Ok(None)
            }
            1 => {
                let pr = matching.remove(0);
                debug!(head_branch, pr_number = pr.number, "found existing PR");
                Ok(Some(pr))
            }
            count => Err(Error::AmbiguousRemoteState {
                branch: head_branch.to_string(),
                count,
            }),
        }
    }

    async fn create_pr(&self, pr: &NewPullRequest) -> Result<PullRequest> {
        debug!(head = %pr.head, base = %pr.base, draft = pr.draft, "creating PR");
        let created = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .create(&pr.title, &pr.head, &pr.base)
            .body(&pr.body)
            .draft(pr.draft)
            .send()
            .await?;

        let result = pr_from_octocrab(&created);
        debug!(pr_number = result.number, "created PR");
        Ok(result)
    }

    async fn update_pr(&self, pr_number: u64, update: &PullRequestUpdate) -> Result<PullRequest> {
        debug!(pr_number, base = %update.base, draft = update.draft, "updating PR");
        let updated = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .update(pr_number)
            .title(&update.title)
            .body(&update.body)
            .base(&update.base)
            .send()
            .await?;

        let mut result = pr_from_octocrab(&updated);
        if result.is_draft != update.draft {
            let node_id = result.node_id.clone().ok_or_else(|| {
                Error::GitHubApi("PR missing node_id for GraphQL mutation".to_string())
            })?;
            result.is_draft = self.set_draft(pr_number, &node_id, update.draft).await?;
        }

        debug!(pr_number, "updated PR");
        Ok(result)
    }

    async fn get_pr_details(&self, pr_number: u64) -> Result<Option<PullRequestDetails>> {
        debug!(pr_number, "getting PR details");

        let pr = match self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .get(pr_number)
            .await
        {
            Ok(pr) => pr,
            Err(e) if is_not_found(&e) => {
                debug!(pr_number, "PR no longer exists");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let state = match pr.state {
            Some(octocrab::models::IssueState::Open) => PrState::Open,
            Some(octocrab::models::IssueState::Closed) if pr.merged_at.is_some() => PrState::Merged,
            // IssueState is non-exhaustive
            Some(_) | None => PrState::Closed,
        };

        let details = PullRequestDetails {
            number: pr.number,
            title: pr.title.clone().unwrap_or_default(),
            state,
            head_ref: pr.head.ref_field.clone(),
            html_url: pr
                .html_url
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
        };

        debug!(pr_number, state = %details.state, "got PR details");
        Ok(Some(details))
    }

    async fn list_pr_comments(&self, pr_number: u64) -> Result<Vec<PrComment>> {
        debug!(pr_number, "listing PR comments");
        let first = self
            .client
            .issues(&self.config.owner, &self.config.repo)
            .list_comments(pr_number)
            .per_page(100)
            .send()
            .await?;
        let comments = self.client.all_pages(first).await?;

        let result: Vec<PrComment> = comments
            .into_iter()
            .map(|c| PrComment {
                id: c.id.0,
                body: c.body.unwrap_or_default(),
            })
            .collect();
        debug!(pr_number, count = result.len(), "listed PR comments");
        Ok(result)
    }

    async fn create_pr_comment(&self, pr_number: u64, body: &str) -> Result<()> {
        debug!(pr_number, "creating PR comment");
        self.client
            .issues(&self.config.owner, &self.config.repo)
            .create_comment(pr_number, body)
            .await?;
        debug!(pr_number, "created PR comment");
        Ok(())
    }

    async fn update_pr_comment(&self, pr_number: u64, comment_id: u64, body: &str) -> Result<()> {
        debug!(pr_number, comment_id, "updating PR comment");
        self.client
            .issues(&self.config.owner, &self.config.repo)
            .update_comment(octocrab::models::CommentId(comment_id), body)
            .await?;
        debug!(comment_id, "updated PR comment");
        Ok(())
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}
