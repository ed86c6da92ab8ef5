//! Built-in posts shown when no source delivers data.

use super::models::FeedItem;

struct StaticPost {
    title: &'static str,
    link: &'static str,
    thumbnail: &'static str,
    published_at: &'static str,
    categories: [&'static str; 3],
    summary: &'static str,
}

static FALLBACK_POSTS: [StaticPost; 3] = [
    StaticPost {
        title: "Building Production-Grade Multi-Agent Systems with LangGraph",
        link: "https://medium.com/@agusain2001?p=langgraph",
        thumbnail: "https://miro.medium.com/max/1200/1*mk1-6aYaf_Bes1E3Imhc0A.jpeg",
        published_at: "2024-12-15",
        categories: ["AI", "LangGraph", "Python"],
        summary: "A deep dive into architecting scalable multi-agent AI systems for production environments.",
    },
    StaticPost {
        title: "RAG Systems: Achieving 95% Context Retrieval Accuracy",
        link: "https://medium.com/@agusain2001?p=rag",
        thumbnail: "https://miro.medium.com/max/1200/1*sHhtYhaCe2Uc3IU0IgKwIQ.png",
        published_at: "2024-11-20",
        categories: ["RAG", "Vector DB", "LLM"],
        summary: "Optimizing Retrieval-Augmented Generation pipelines with ChromaDB and semantic chunking.",
    },
    StaticPost {
        title: "FastAPI Best Practices: Building APIs That Scale",
        link: "https://medium.com/@agusain2001?p=fastapi",
        thumbnail: "https://miro.medium.com/max/1200/1*du7p50wS_fIsaC_lR18qsg.png",
        published_at: "2024-10-10",
        categories: ["FastAPI", "Backend", "Python"],
        summary: "Lessons learned from handling 1000+ daily requests with sub-200ms latency.",
    },
];

pub fn fallback_items() -> Vec<FeedItem> {
    FALLBACK_POSTS
        .iter()
        .map(|post| FeedItem {
            title: post.title.to_string(),
            link: post.link.to_string(),
            thumbnail: post.thumbnail.to_string(),
            published_at: post.published_at.to_string(),
            categories: post.categories.iter().map(|c| c.to_string()).collect(),
            summary: post.summary.to_string(),
        })
        .collect()
}
