use crate::application::sitewise_client::ApiResult;
use crate::application::resource_provider::ResourceProvider;
use crate::domain::query::ExecuteQueryStatement;
use crate::domain::sitewise::{ExecuteQueryRequest, ExecuteQueryResponse};

/// Runs one page of a SQL-style statement; the token resumes a previous page.
pub async fn execute_query(
    provider: &ResourceProvider,
    query: &ExecuteQueryStatement,
) -> ApiResult<ExecuteQueryResponse> {
    let request = ExecuteQueryRequest {
        query_statement: query.query_statement.clone(),
        next_token: query.base.next_token.clone(),
        max_results: None,
    };
    tracing::debug!("Executing statement for {}", query.base.ref_id);
    let mut response = provider.client().execute_query(&request).await?;
    response.next_token = response.next_token.filter(|t| !t.is_empty());
    Ok(response)
}
