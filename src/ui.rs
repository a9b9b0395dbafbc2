use iocraft::prelude::*;

use crate::format::format_size;
use crate::history::HistoryEntry;
use crate::model::{RemoteFile, UploadItem};

#[derive(Default, Props)]
pub struct MessageProps {
    pub message: String,
}

#[component]
pub fn ErrorMessage(props: &MessageProps) -> impl Into<AnyElement<'static>> {
    element! {
        View(flex_direction: FlexDirection::Row) {
            Text(content: "✗ ", color: Color::Red, weight: Weight::Bold)
            Text(content: props.message.clone(), color: Color::Red)
        }
    }
}

#[component]
pub fn WarningMessage(props: &MessageProps) -> impl Into<AnyElement<'static>> {
    element! {
        View(flex_direction: FlexDirection::Row) {
            Text(content: "! ", color: Color::Yellow, weight: Weight::Bold)
            Text(content: props.message.clone(), color: Color::Yellow)
        }
    }
}

#[component]
pub fn SuccessMessage(props: &MessageProps) -> impl Into<AnyElement<'static>> {
    element! {
        View(flex_direction: FlexDirection::Row) {
            Text(content: "✓ ", color: Color::Green, weight: Weight::Bold)
            Text(content: props.message.clone(), color: Color::Green)
        }
    }
}

#[derive(Default, Props)]
pub struct UploadListProps {
    pub items: Vec<UploadItem>,
    pub total_size: u64,
    pub error: Option<String>,
}

#[component]
pub fn UploadList(props: &UploadListProps) -> impl Into<AnyElement<'static>> {
    element! {
        View(flex_direction: FlexDirection::Column) {
            #(props.items.iter().map(|item| {
                element! {
                    View(flex_direction: FlexDirection::Column) {
                        View(flex_direction: FlexDirection::Row) {
                            Text(weight: Weight::Bold, content: item.name.clone())
                            Text(
                                color: Color::DarkGrey,
                                content: format!("  {}  {}", item.mime_type, format_size(item.size))
                            )
                        }
                        #(item.preview.as_ref().map(|preview| element! {
                            Text(color: Color::Grey, content: format!("│ {}", preview.replace('\n', " ")))
                        }))
                    }
                }
            }))
            Text(content: format!("{} file(s), {}", props.items.len(), format_size(props.total_size)))
            #(props.error.as_ref().map(|error| element! {
                ErrorMessage(message: error.clone())
            }))
        }
    }
}

#[derive(Default, Props)]
pub struct CatalogListProps {
    pub files: Vec<RemoteFile>,
    pub selected: Vec<String>,
}

#[component]
pub fn CatalogList(props: &CatalogListProps) -> impl Into<AnyElement<'static>> {
    element! {
        View(flex_direction: FlexDirection::Column) {
            #(props.files.iter().enumerate().map(|(index, file)| {
                let checked = if props.selected.contains(&file.id) { "[x]" } else { "[ ]" };
                element! {
                    View(flex_direction: FlexDirection::Row) {
                        Text(content: format!("{} {:>3}. ", checked, index + 1))
                        Text(weight: Weight::Bold, content: file.name.clone())
                        Text(color: Color::DarkGrey, content: format!("  {}", file.mime_type))
                    }
                }
            }))
        }
    }
}

#[derive(Default, Props)]
pub struct ShareLinkProps {
    pub url: String,
    pub copied: bool,
}

#[component]
pub fn ShareLinkPanel(props: &ShareLinkProps) -> impl Into<AnyElement<'static>> {
    element! {
        View(
            flex_direction: FlexDirection::Column,
            border_style: BorderStyle::Round,
            border_color: Color::Green
        ) {
            Text(content: "Upload Successful!", color: Color::Green, weight: Weight::Bold)
            Text(content: "Your files are available at:")
            View(flex_direction: FlexDirection::Row) {
                Text(content: props.url.clone(), weight: Weight::Bold)
                #(props.copied.then(|| element! {
                    Text(content: "  Copied", color: Color::Green)
                }))
            }
        }
    }
}

#[derive(Default, Props)]
pub struct HistoryListProps {
    pub entries: Vec<HistoryEntry>,
}

#[component]
pub fn HistoryList(props: &HistoryListProps) -> impl Into<AnyElement<'static>> {
    element! {
        View(flex_direction: FlexDirection::Column) {
            #(props.entries.iter().rev().map(|entry| {
                element! {
                    View(flex_direction: FlexDirection::Row) {
                        Text(
                            color: Color::DarkGrey,
                            content: format!("{}  ", humantime::format_rfc3339_seconds(entry.sent_at()))
                        )
                        Text(weight: Weight::Bold, content: entry.link.clone())
                        Text(
                            color: Color::DarkGrey,
                            content: format!("  {} file(s), {}", entry.files, format_size(entry.total_size))
                        )
                    }
                }
            }))
        }
    }
}

#[derive(Default, Props)]
pub struct BusyIndicatorProps {
    pub title: String,
    pub message: String,
}

/// Indeterminate progress shown while a long operation runs.
#[component]
pub fn BusyIndicator(props: &BusyIndicatorProps) -> impl Into<AnyElement<'static>> {
    element! {
        View(flex_direction: FlexDirection::Column) {
            View(flex_direction: FlexDirection::Row) {
                Spinner()
                Text(content: format!(" {}", props.title), weight: Weight::Bold)
            }
            Text(content: props.message.clone(), color: Color::DarkGrey)
        }
    }
}

#[derive(Default, Props)]
pub struct SpinnerProps {
    pub color: Option<Color>,
}

#[component]
pub fn Spinner(props: &SpinnerProps, mut hooks: Hooks) -> impl Into<AnyElement<'static>> {
    let mut frame = hooks.use_state(|| 0usize);

    hooks.use_future(async move {
        loop {
            tokio::time::sleep(tokio::time::Duration::from_millis(120)).await;
            frame.set((frame.get() + 1) % SPINNER_FRAMES.len());
        }
    });

    let color = props.color.unwrap_or(Color::Cyan);

    element! {
        Text(content: SPINNER_FRAMES[frame.get()], color: color)
    }
}

const SPINNER_FRAMES: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

#[derive(Default, Props)]
pub struct InputPromptProps {
    pub prompt: String,
    pub default: Option<String>,
    pub description: Option<String>,
}

#[component]
pub fn InputPrompt(props: &InputPromptProps) -> impl Into<AnyElement<'static>> {
    let prompt = match &props.default {
        Some(default) => format!("{} [{}]", props.prompt, default),
        None => props.prompt.clone(),
    };

    element! {
        View(flex_direction: FlexDirection::Column) {
            Text(content: prompt, weight: Weight::Bold)
            #(props.description.as_ref().map(|description| element! {
                Text(content: description.clone(), color: Color::DarkGrey)
            }))
        }
    }
}

#[component]
pub fn ConfigHeader() -> impl Into<AnyElement<'static>> {
    element! {
        View(
            flex_direction: FlexDirection::Column,
            border_style: BorderStyle::Round,
            border_color: Color::Blue
        ) {
            Text(content: "threef configuration", weight: Weight::Bold)
            Text(content: "Values are saved to the config file; environment variables override them.")
        }
    }
}
