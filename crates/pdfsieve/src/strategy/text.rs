//! Text strategy: one block per page, first provider that succeeds wins.

use super::{ProviderSet, RunContext, run_pages};
use crate::core::capabilities::Capabilities;
use crate::diagnostics::{Diagnostics, Stream};
use crate::document::{Document, PageNumber};
use crate::error::Result;
use crate::providers::TextProvider;
use crate::types::{TextBlock, TextSource};
use std::sync::Arc;

/// Providers in priority order: layout-aware when available, then plain.
pub fn text_chain(providers: &ProviderSet, capabilities: &Capabilities) -> Vec<Arc<dyn TextProvider>> {
    let mut chain = Vec::new();
    if capabilities.enhanced_text
        && let Some(layout) = &providers.layout_text
    {
        chain.push(Arc::clone(layout));
    }
    if let Some(plain) = &providers.plain_text {
        chain.push(Arc::clone(plain));
    }
    chain
}

/// Extract text for every page. Returns exactly one block per page.
#[tracing::instrument(skip_all, fields(pages = document.page_count()))]
pub async fn extract_text(
    document: &Document,
    chain: &[Arc<dyn TextProvider>],
    ctx: &RunContext,
) -> Result<Vec<TextBlock>> {
    let names: Vec<&str> = chain.iter().map(|p| p.name()).collect();
    tracing::info!(providers = ?names, "Text strategy selected");

    let chain: Arc<[Arc<dyn TextProvider>]> = chain.into();
    let outcomes = run_pages(document.pages(), ctx.max_concurrent_pages, &ctx.cancel, |page| {
        let chain = Arc::clone(&chain);
        let document = document.clone();
        let diagnostics = ctx.diagnostics.clone();
        async move { text_for_page(&chain, &document, page, &diagnostics).await }
    })
    .await?;

    let mut blocks: Vec<TextBlock> = outcomes.done.into_iter().map(|(_, block)| block).collect();
    for page in outcomes.lost {
        ctx.diagnostics
            .warn(Stream::Text, Some(page), "text extraction task aborted unexpectedly");
        blocks.push(empty_block(page));
    }
    Ok(blocks)
}

async fn text_for_page(
    chain: &[Arc<dyn TextProvider>],
    document: &Document,
    page: PageNumber,
    diagnostics: &Diagnostics,
) -> TextBlock {
    let mut failures = Vec::new();

    for provider in chain {
        match provider.extract_page(document, page).await {
            Ok(content) => {
                tracing::debug!(provider = provider.name(), page = page.get(), "Text extracted");
                return TextBlock {
                    page,
                    content,
                    source: provider.source(),
                };
            }
            Err(err) => {
                tracing::debug!(provider = provider.name(), page = page.get(), error = %err, "Text provider failed");
                failures.push(format!("{}: {}", provider.name(), err));
            }
        }
    }

    let message = if failures.is_empty() {
        "no text provider available".to_string()
    } else {
        format!("all text providers failed ({})", failures.join("; "))
    };
    diagnostics.warn(Stream::Text, Some(page), message);
    empty_block(page)
}

fn empty_block(page: PageNumber) -> TextBlock {
    TextBlock {
        page,
        content: String::new(),
        source: TextSource::None,
    }
}
