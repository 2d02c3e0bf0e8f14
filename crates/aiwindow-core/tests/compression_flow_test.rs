use aiwindow_core::compression::{HistoryCompressor, Summarizer, SummaryRequest};
use aiwindow_core::config::{CompressionConfig, ConfigLoader};
use aiwindow_core::core_types::ChatTurn;
use aiwindow_core::errors::ChatCoreError;
use aiwindow_core::parsing::{ParseMode, ResponseParser};
use aiwindow_core::tokens;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
struct MockSummarizer {
    summaries: Arc<Mutex<Vec<Result<String, ChatCoreError>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockSummarizer {
    fn new(summaries: Vec<Result<String, ChatCoreError>>) -> Self {
        Self {
            summaries: Arc::new(Mutex::new(summaries)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(&self, request: SummaryRequest) -> Result<String, ChatCoreError> {
        self.prompts.lock().unwrap().push(request.prompt);
        let mut summaries = self.summaries.lock().unwrap();
        if summaries.is_empty() {
            Ok("The conversation continued.".to_string())
        } else {
            summaries.remove(0)
        }
    }
}

fn model_reply(n: usize) -> String {
    format!(
        "```json\n{{\"response\": {{\"title\": \"Answer {n}\", \"content\": \"This is the detailed answer number {n} to the question\", \"metadata\": {{\"confidence\": 0.9, \"category\": \"general\"}}}}}}\n```"
    )
}

/// One user message plus the parsed assistant reply, compressing first when due.
async fn exchange(
    history: &mut Vec<ChatTurn>,
    compressor: &HistoryCompressor,
    parser: &ResponseParser,
    n: usize,
) {
    if compressor.should_compress(history) {
        let result = compressor
            .compress_or_keep(history, compressor.config().keep_recent_count)
            .await;
        *history = result.history;
    }

    history.push(ChatTurn::user(format!("Question number {n} about the topic")));

    let outcome = parser.parse(&model_reply(n), ParseMode::Lenient);
    assert!(outcome.is_success(), "reply {n} should parse cleanly: {:?}", outcome);
    history.push(ChatTurn::from_outcome(&outcome, parser.config().raw_preview_chars));
}

#[tokio::test]
async fn test_long_conversation_stays_bounded() {
    let summarizer = MockSummarizer::new(vec![]);
    let compressor = HistoryCompressor::new(Arc::new(summarizer.clone()), CompressionConfig::default());
    let parser = ResponseParser::default();
    let mut history = Vec::new();
    let mut uncompressed = Vec::new();

    for n in 0..20 {
        exchange(&mut history, &compressor, &parser, n).await;
        uncompressed.push(ChatTurn::user(format!("Question number {n} about the topic")));
        uncompressed.push(ChatTurn::assistant(format!(
            "This is the detailed answer number {n} to the question"
        )));
    }

    let summaries: Vec<&ChatTurn> = history.iter().filter(|t| t.is_summary).collect();
    assert!(!summaries.is_empty());
    assert!(history.len() < uncompressed.len());
    assert!(tokens::estimate_tokens_for_history(&history) < tokens::estimate_tokens_for_history(&uncompressed));

    // Summaries stay at the front, in creation order.
    let prefix = history.iter().take_while(|t| t.is_summary).count();
    assert_eq!(prefix, summaries.len());
    for (i, summary) in summaries.iter().enumerate() {
        assert_eq!(summary.title.as_deref(), Some(format!("Summary #{}", i + 1).as_str()));
    }

    // Each summarization only ever saw plain turns, never an earlier summary.
    for prompt in summarizer.prompts() {
        assert!(!prompt.contains("The conversation continued."));
        assert!(prompt.contains("User: Question number"));
        assert!(prompt.contains("Assistant: This is the detailed answer"));
    }
}

#[tokio::test]
async fn test_second_compression_keeps_first_summary_verbatim() {
    let summarizer = MockSummarizer::new(vec![
        Ok("First part: greetings and setup.".to_string()),
        Ok("Second part: follow-up questions.".to_string()),
    ]);
    let compressor = HistoryCompressor::new(Arc::new(summarizer), CompressionConfig::default());
    let parser = ResponseParser::default();
    let mut history = Vec::new();

    for n in 0..5 {
        exchange(&mut history, &compressor, &parser, n).await;
    }
    assert_eq!(history.len(), 10);

    let first = compressor.compress(&history).await.unwrap();
    assert_eq!(first.len(), 6);
    assert_eq!(first[0].text, "First part: greetings and setup.");

    let mut grown = first.clone();
    for n in 5..8 {
        grown.push(ChatTurn::user(format!("Question number {n}")));
        grown.push(ChatTurn::assistant(format!("Answer {n}")));
    }
    assert!(compressor.should_compress(&grown));

    let second = compressor.compress(&grown).await.unwrap();
    assert_eq!(second[0], first[0]);
    assert_eq!(second[1].text, "Second part: follow-up questions.");
    assert_eq!(second.iter().filter(|t| t.is_summary).count(), 2);
    assert_eq!(second.len(), 2 + 5);
    assert_eq!(second[1].summarized_count, Some(grown.len() - 1 - 5));

    let stats = HistoryCompressor::calculate_compression_stats(&grown, &second);
    assert_eq!(stats.messages_saved, (grown.len() - second.len()) as i64);
    assert!(stats.tokens_saved > 0);
}

#[tokio::test]
async fn test_failed_summarization_keeps_chatting() {
    let summarizer = MockSummarizer::new(vec![Err(ChatCoreError::LLMError(
        "API request failed with status 429".to_string(),
    ))]);
    let compressor = HistoryCompressor::new(Arc::new(summarizer), CompressionConfig::default());
    let parser = ResponseParser::default();
    let mut history = Vec::new();

    for n in 0..5 {
        exchange(&mut history, &compressor, &parser, n).await;
    }
    let before = history.clone();

    let result = compressor.compress_or_keep(&history, 5).await;
    assert!(!result.compressed);
    assert_eq!(result.history, before);
    assert!(result.error.is_some());

    // The next attempt gets a summary.
    let retried = compressor.compress_or_keep(&history, 5).await;
    assert!(retried.compressed);
    assert_eq!(retried.history.len(), 6);
}

#[tokio::test]
async fn test_configured_policy_from_yaml() {
    let config = ConfigLoader::from_str(
        "compression:\n  threshold: 4\n  keep_recent_count: 2\n",
    )
    .unwrap();
    let summarizer = MockSummarizer::new(vec![Ok("Short summary.".to_string())]);
    let compressor = HistoryCompressor::new(Arc::new(summarizer), config.compression.clone());

    let history: Vec<ChatTurn> = (0..4)
        .map(|i| ChatTurn::new(format!("t{i}"), format!("turn {i}"), i % 2 == 0))
        .collect();
    let compressed = compressor.compress(&history).await.unwrap();

    assert_eq!(compressed.len(), 3);
    assert_eq!(compressed[0].original_ids.as_deref().unwrap(), &["t0".to_string(), "t1".to_string()][..]);
    assert_eq!(&compressed[1..], &history[2..]);
}
