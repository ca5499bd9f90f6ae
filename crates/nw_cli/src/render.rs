use nw_client::client::GENERIC_ERROR;
use nw_client::{QueryEntry, QueryState};
use nw_core::{Article, FeedResponse};

pub const DEFAULT_EMPTY: &str = "No articles available right now. Check back later for updates.";

fn article_block(article: &Article, featured: bool) -> String {
    let marker = if featured { "★" } else { "•" };
    let mut lines = vec![format!("{} {}", marker, article.title)];

    let mut byline = vec![article.source.name.as_str()];
    byline.extend(article.author.as_deref());
    byline.push(article.published_at.as_str());
    lines.push(format!("  {}", byline.join(" · ")));

    if featured {
        if let Some(description) = &article.description {
            lines.push(format!("  {}", description));
        }
    }
    lines.push(format!("  {}", article.url));
    lines.join("\n") + "\n"
}

/// Featured first article followed by the rest, in upstream order.
pub fn feed(title: &str, feed: &FeedResponse, empty_message: &str) -> String {
    let header = format!("{}\n{}\n", title, "=".repeat(title.chars().count()));

    let Some((featured, rest)) = feed.articles.split_first() else {
        return format!("{}{}\n", header, empty_message);
    };
    let blocks: Vec<String> = std::iter::once(article_block(featured, true))
        .chain(rest.iter().map(|article| article_block(article, false)))
        .collect();
    header + &blocks.join("\n")
}

pub fn entry(title: &str, entry: &QueryEntry, empty_message: &str) -> String {
    match (entry.state, &entry.data) {
        (QueryState::Success, Some(data)) => feed(title, data, empty_message),
        (QueryState::Error, _) => format!(
            "Something went wrong\n{}\n",
            entry.error.as_deref().unwrap_or(GENERIC_ERROR)
        ),
        _ => "Loading…\n".to_string(),
    }
}
