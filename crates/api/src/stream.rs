use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use extract::{GraphNode, GraphRelationship};
use futures::Stream;
use futures::stream;
use graph::ConsolidatedGraph;
use pipeline::{PipelineError, ProgressEvent, ProgressReporter};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{info, trace, warn};

use crate::routes::{AppState, GenerateRequest};

/// One server-sent frame
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum StreamFrame {
    Progress(ProgressEvent),
    Done {
        done: bool,
        nodes: Vec<GraphNode>,
        edges: Vec<GraphRelationship>,
    },
    Failed {
        error: String,
    },
}

impl From<ConsolidatedGraph> for StreamFrame {
    fn from(graph: ConsolidatedGraph) -> Self {
        StreamFrame::Done {
            done: true,
            nodes: graph.nodes,
            edges: graph.edges,
        }
    }
}

type GraphTask = JoinHandle<Result<ConsolidatedGraph, PipelineError>>;

/// Aborts the pipeline task when dropped, e.g. when the client disconnects
struct PipelineTask(GraphTask);

impl PipelineTask {
    async fn finish(mut self) -> StreamFrame {
        match (&mut self.0).await {
            Ok(Ok(graph)) => graph.into(),
            Ok(Err(e)) => {
                warn!(error = %e, "Streaming graph generation failed");
                StreamFrame::Failed { error: e.to_string() }
            }
            Err(e) => StreamFrame::Failed {
                error: format!("Graph generation task failed: {}", e),
            },
        }
    }
}

impl Drop for PipelineTask {
    fn drop(&mut self) {
        if !self.0.is_finished() {
            info!("Progress stream dropped, aborting graph generation");
            self.0.abort();
        }
    }
}

/// Reader side of one request: progress frames in order, then one final frame
pub struct ProgressFrames {
    events: mpsc::Receiver<ProgressEvent>,
    task: Option<PipelineTask>,
    poll_interval: Duration,
}

impl ProgressFrames {
    pub fn new(
        events: mpsc::Receiver<ProgressEvent>,
        task: GraphTask,
        poll_interval: Duration,
    ) -> Self {
        Self {
            events,
            task: Some(PipelineTask(task)),
            poll_interval,
        }
    }

    /// `None` once the final frame has been handed out
    pub async fn next_frame(&mut self) -> Option<StreamFrame> {
        loop {
            self.task.as_ref()?;

            match timeout(self.poll_interval, self.events.recv()).await {
                Ok(Some(event)) => return Some(StreamFrame::Progress(event)),
                // The reporter is dropped when the pipeline returns
                Ok(None) => {
                    let task = self.task.take()?;
                    return Some(task.finish().await);
                }
                Err(_) => trace!("No progress event within poll interval"),
            }
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<Event, axum::Error>> {
        stream::unfold(self, |mut frames| async move {
            let frame = frames.next_frame().await?;
            Some((Event::default().json_data(frame), frames))
        })
    }
}

pub async fn generate_graph_stream(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let (reporter, events) = ProgressReporter::channel();
    let pipeline = state.pipeline.clone();
    let poll_interval = pipeline.config().progress_poll_interval();

    let task = tokio::spawn(async move { pipeline.generate(&req.text, reporter).await });

    Sse::new(ProgressFrames::new(events, task, poll_interval).into_stream())
        .keep_alive(KeepAlive::default())
}
