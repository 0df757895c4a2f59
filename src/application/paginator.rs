// Page iteration under page-count and point-count budgets
use crate::application::sitewise_client::ApiResult;
use std::future::Future;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBudget {
    pub max_pages: usize,
    pub max_points: usize,
}

impl PageBudget {
    pub fn new(max_pages: usize, max_points: usize) -> Self {
        Self {
            max_pages: max_pages.max(1),
            max_points: max_points.max(1),
        }
    }
}

/// One page as returned by an endpoint. `points` counts data points, which
/// differs from `items.len()` for batched endpoints.
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub points: usize,
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_token: Option<String>) -> Self {
        let points = items.len();
        Self {
            items,
            points,
            next_token: next_token.filter(|t| !t.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageControl {
    Continue,
    Done,
}

#[derive(Debug)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub points: usize,
    pub pages: usize,
    /// Token of the last page visited; `Some` means more data exists upstream.
    pub next_token: Option<String>,
}

pub async fn paginate<T, F, Fut>(
    budget: PageBudget,
    initial_token: Option<String>,
    fetch: F,
) -> ApiResult<Paginated<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = ApiResult<Page<T>>>,
{
    paginate_with(budget, initial_token, fetch, |_| PageControl::Continue).await
}

/// Visits pages until the handler says done, the point budget is reached, the
/// page budget is spent, or the endpoint has no more pages.
pub async fn paginate_with<T, F, Fut, H>(
    budget: PageBudget,
    initial_token: Option<String>,
    mut fetch: F,
    mut on_page: H,
) -> ApiResult<Paginated<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = ApiResult<Page<T>>>,
    H: FnMut(&Page<T>) -> PageControl,
{
    let mut items = Vec::new();
    let mut points = 0;
    let mut pages = 0;
    let mut token = initial_token;

    loop {
        let page = fetch(token.take()).await?;
        pages += 1;
        points += page.points;
        let control = on_page(&page);
        token = page.next_token;
        items.extend(page.items);

        tracing::debug!(
            "Fetched page {} ({} points so far, more: {})",
            pages,
            points,
            token.is_some()
        );

        if token.is_none()
            || control == PageControl::Done
            || points >= budget.max_points
            || pages >= budget.max_pages
        {
            break;
        }
    }

    Ok(Paginated {
        items,
        points,
        pages,
        next_token: token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Serves `pages` pages of `size` items each, recording the tokens it was given.
    fn pages(size: usize, total: usize) -> (Mutex<Vec<Option<String>>>, impl Fn(usize) -> Page<usize>) {
        let seen = Mutex::new(Vec::new());
        let build = move |index: usize| {
            let items = (index * size..(index + 1) * size).collect();
            let next = (index + 1 < total).then(|| format!("t{}", index + 1));
            Page::new(items, next)
        };
        (seen, build)
    }

    #[tokio::test]
    async fn test_stops_when_token_exhausted() {
        let (seen, build) = pages(2, 3);
        let result = paginate(PageBudget::new(10, 100), None, |token| {
            seen.lock().push(token.clone());
            let index = token.map(|t| t[1..].parse::<usize>().unwrap()).unwrap_or(0);
            let page = build(index);
            async move { Ok(page) }
        })
        .await
        .unwrap();

        assert_eq!(result.items, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(result.pages, 3);
        assert_eq!(result.next_token, None);
        assert_eq!(*seen.lock(), vec![None, Some("t1".into()), Some("t2".into())]);
    }

    #[tokio::test]
    async fn test_page_and_point_budgets_return_last_token() {
        let (_, build) = pages(5, 10);
        let by_pages = paginate(PageBudget::new(2, 1_000), None, |token| {
            let index = token.map(|t| t[1..].parse::<usize>().unwrap()).unwrap_or(0);
            let page = build(index);
            async move { Ok(page) }
        })
        .await
        .unwrap();
        assert_eq!(by_pages.pages, 2);
        assert_eq!(by_pages.next_token.as_deref(), Some("t2"));

        let by_points = paginate(PageBudget::new(10, 12), Some("t4".into()), |token| {
            let index = token.map(|t| t[1..].parse::<usize>().unwrap()).unwrap_or(0);
            let page = build(index);
            async move { Ok(page) }
        })
        .await
        .unwrap();
        assert_eq!(by_points.pages, 3);
        assert_eq!(by_points.points, 15);
        assert_eq!(by_points.items.first(), Some(&20));
        assert_eq!(by_points.next_token.as_deref(), Some("t7"));
    }

    #[tokio::test]
    async fn test_handler_can_stop_early() {
        let (_, build) = pages(1, 10);
        let result = paginate_with(
            PageBudget::new(10, 100),
            None,
            |token| {
                let index = token.map(|t| t[1..].parse::<usize>().unwrap()).unwrap_or(0);
                let page = build(index);
                async move { Ok(page) }
            },
            |page| {
                if page.items.contains(&1) {
                    PageControl::Done
                } else {
                    PageControl::Continue
                }
            },
        )
        .await
        .unwrap();
        assert_eq!(result.items, vec![0, 1]);
        assert_eq!(result.next_token.as_deref(), Some("t2"));
    }
}
