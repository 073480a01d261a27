// Portal Autologin - AT-SPI Backend
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! AT-SPI accessibility bus backend.
//!
//! Connects to the accessibility bus advertised by `org.a11y.Bus` on the
//! session bus, walks the tree of the active window and forwards window
//! and content signals as [`UiEventKind`]s.
//!
//! Node methods are blocking: they drive the async connection through the
//! runtime handle captured at connect time, so they must only be called
//! from blocking threads (`tokio::task::spawn_blocking`).

use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};
use zbus::message::Type as MessageType;
use zbus::zvariant::{DynamicType, OwnedObjectPath, Value};
use zbus::{Connection, MatchRule, Message, MessageStream};

use super::{UiEventKind, UiNode, UiTree};
use crate::models::{Error, Result};

const A11Y_BUS_NAME: &str = "org.a11y.Bus";
const A11Y_BUS_PATH: &str = "/org/a11y/bus";

const REGISTRY_NAME: &str = "org.a11y.atspi.Registry";
const REGISTRY_PATH: &str = "/org/a11y/atspi/registry";
const DESKTOP_PATH: &str = "/org/a11y/atspi/accessible/root";

const ACCESSIBLE_IFACE: &str = "org.a11y.atspi.Accessible";
const ACTION_IFACE: &str = "org.a11y.atspi.Action";
const TEXT_IFACE: &str = "org.a11y.atspi.Text";
const PROPERTIES_IFACE: &str = "org.freedesktop.DBus.Properties";

const WINDOW_EVENTS_IFACE: &str = "org.a11y.atspi.Event.Window";
const OBJECT_EVENTS_IFACE: &str = "org.a11y.atspi.Event.Object";

/// Per-call limit so a hung application cannot stall a search.
const CALL_TIMEOUT: Duration = Duration::from_secs(2);

/// `ATSPI_STATE_ACTIVE`
const STATE_ACTIVE: u32 = 1;
/// `ATSPI_STATE_DEFUNCT`
const STATE_DEFUNCT: u32 = 6;

/// Whether an AT-SPI state set (array of 32-bit words) contains `state`.
fn has_state(states: &[u32], state: u32) -> bool {
    let word = (state / 32) as usize;
    states
        .get(word)
        .map(|bits| bits & (1 << (state % 32)) != 0)
        .unwrap_or(false)
}

/// Map an AT-SPI event signal to the class the controller cares about.
pub fn classify_event(interface: &str, member: &str) -> UiEventKind {
    match (interface, member) {
        (WINDOW_EVENTS_IFACE, _) => UiEventKind::WindowStateChanged,
        (OBJECT_EVENTS_IFACE, "ChildrenChanged" | "TextChanged" | "PropertyChange") => {
            UiEventKind::ContentChanged
        }
        _ => UiEventKind::Other,
    }
}

/// Connection to the accessibility bus.
#[derive(Debug)]
struct Bus {
    conn: Connection,
    runtime: Handle,
}

impl Bus {
    fn call<B>(&self, dest: &str, path: &str, iface: &str, method: &str, body: &B) -> Result<Message>
    where
        B: serde::Serialize + DynamicType,
    {
        let call = self
            .conn
            .call_method(Some(dest), path, Some(iface), method, body);
        self.runtime.block_on(async {
            match tokio::time::timeout(CALL_TIMEOUT, call).await {
                Ok(reply) => reply.map_err(|e| Error::Accessibility(e.to_string())),
                Err(_) => Err(Error::Accessibility(format!("{}.{} timed out", iface, method))),
            }
        })
    }

    fn children(&self, dest: &str, path: &str) -> Vec<(String, String)> {
        let reply = match self.call(dest, path, ACCESSIBLE_IFACE, "GetChildren", &()) {
            Ok(reply) => reply,
            Err(e) => {
                debug!("GetChildren failed on {}{}: {}", dest, path, e);
                return Vec::new();
            }
        };
        reply
            .body()
            .deserialize::<Vec<(String, OwnedObjectPath)>>()
            .map(|refs| {
                refs.into_iter()
                    .map(|(name, path)| (name, path.as_str().to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn states(&self, dest: &str, path: &str) -> Vec<u32> {
        self.call(dest, path, ACCESSIBLE_IFACE, "GetState", &())
            .and_then(|reply| reply.body().deserialize::<Vec<u32>>().map_err(Error::from))
            .unwrap_or_default()
    }

    fn property_str(&self, dest: &str, path: &str, iface: &str, name: &str) -> Option<String> {
        let reply = self
            .call(dest, path, PROPERTIES_IFACE, "Get", &(iface, name))
            .ok()?;
        let body = reply.body();
        let value: Value<'_> = body.deserialize().ok()?;
        match value {
            Value::Str(s) if !s.as_str().is_empty() => Some(s.to_string()),
            _ => None,
        }
    }

    fn property_i32(&self, dest: &str, path: &str, iface: &str, name: &str) -> Option<i32> {
        let reply = self
            .call(dest, path, PROPERTIES_IFACE, "Get", &(iface, name))
            .ok()?;
        let body = reply.body();
        let value: Value<'_> = body.deserialize().ok()?;
        match value {
            Value::I32(n) => Some(n),
            _ => None,
        }
    }
}

/// AT-SPI backed [`UiTree`].
#[derive(Debug, Clone, Default)]
pub struct AtspiTree {
    bus: Option<Arc<Bus>>,
}

impl AtspiTree {
    /// Connect to the accessibility bus. Must be called inside a runtime.
    pub async fn connect() -> Result<Self> {
        let session = Connection::session().await?;
        let reply = session
            .call_method(
                Some(A11Y_BUS_NAME),
                A11Y_BUS_PATH,
                Some(A11Y_BUS_NAME),
                "GetAddress",
                &(),
            )
            .await
            .map_err(|e| Error::Accessibility(e.to_string()))?;
        let address: String = reply.body().deserialize()?;
        debug!("Accessibility bus at {}", address);

        let conn = zbus::connection::Builder::address(address.as_str())?
            .build()
            .await
            .map_err(|e| Error::Accessibility(e.to_string()))?;
        info!("Connected to accessibility bus");

        Ok(Self {
            bus: Some(Arc::new(Bus {
                conn,
                runtime: Handle::current(),
            })),
        })
    }

    /// A tree that is never available; used when the bus cannot be reached.
    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Forward window and content signals into `sink` until the bus closes.
    ///
    /// Events are hints: when the channel is full the event is dropped.
    pub async fn run_event_pump(&self, sink: mpsc::Sender<UiEventKind>) -> Result<()> {
        let Some(bus) = self.bus.as_ref() else {
            return Err(Error::Accessibility("not connected".into()));
        };
        let conn = &bus.conn;

        for event in ["window:", "object:children-changed", "object:text-changed"] {
            if let Err(e) = conn
                .call_method(
                    Some(REGISTRY_NAME),
                    REGISTRY_PATH,
                    Some(REGISTRY_NAME),
                    "RegisterEvent",
                    &(event,),
                )
                .await
            {
                debug!("RegisterEvent {} failed: {}", event, e);
            }
        }

        let windows = MatchRule::builder()
            .msg_type(MessageType::Signal)
            .interface(WINDOW_EVENTS_IFACE)?
            .build();
        let objects = MatchRule::builder()
            .msg_type(MessageType::Signal)
            .interface(OBJECT_EVENTS_IFACE)?
            .build();
        let windows = MessageStream::for_match_rule(windows, conn, Some(64)).await?;
        let objects = MessageStream::for_match_rule(objects, conn, Some(256)).await?;
        let stream = windows.merge(objects);
        tokio::pin!(stream);

        info!("Listening for accessibility events");
        while let Some(msg) = stream.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    warn!("Accessibility event stream error: {}", e);
                    continue;
                }
            };
            let header = msg.header();
            let (Some(iface), Some(member)) = (header.interface(), header.member()) else {
                continue;
            };
            let kind = classify_event(iface.as_str(), member.as_str());
            if kind.is_relevant() && sink.try_send(kind).is_err() && sink.is_closed() {
                break;
            }
        }
        Ok(())
    }
}

impl UiTree for AtspiTree {
    type Node = AtspiNode;

    fn active_root(&self) -> Option<AtspiNode> {
        let bus = self.bus.as_ref()?;
        for (app, app_path) in bus.children(REGISTRY_NAME, DESKTOP_PATH) {
            for (name, path) in bus.children(&app, &app_path) {
                if has_state(&bus.states(&name, &path), STATE_ACTIVE) {
                    debug!("Active window {}{}", name, path);
                    return Some(AtspiNode::new(Arc::clone(bus), name, path, None));
                }
            }
        }
        None
    }

    fn is_available(&self) -> bool {
        self.bus.is_some()
    }
}

#[derive(Debug)]
struct NodeInner {
    bus: Arc<Bus>,
    name: String,
    path: String,
    /// The node this handle was reached through.
    parent: Option<AtspiNode>,
    interfaces: OnceLock<Vec<String>>,
}

/// Reference to one accessible object.
#[derive(Debug, Clone)]
pub struct AtspiNode {
    inner: Arc<NodeInner>,
}

impl AtspiNode {
    fn new(bus: Arc<Bus>, name: String, path: String, parent: Option<AtspiNode>) -> Self {
        Self {
            inner: Arc::new(NodeInner {
                bus,
                name,
                path,
                parent,
                interfaces: OnceLock::new(),
            }),
        }
    }

    fn bus(&self) -> &Bus {
        &self.inner.bus
    }

    fn implements(&self, iface: &str) -> bool {
        self.inner
            .interfaces
            .get_or_init(|| {
                self.bus()
                    .call(&self.inner.name, &self.inner.path, ACCESSIBLE_IFACE, "GetInterfaces", &())
                    .and_then(|reply| reply.body().deserialize::<Vec<String>>().map_err(Error::from))
                    .unwrap_or_default()
            })
            .iter()
            .any(|i| i == iface)
    }
}

impl UiNode for AtspiNode {
    fn text(&self) -> Option<String> {
        if !self.implements(TEXT_IFACE) {
            return None;
        }
        let reply = self
            .bus()
            .call(&self.inner.name, &self.inner.path, TEXT_IFACE, "GetText", &(0i32, -1i32))
            .ok()?;
        reply
            .body()
            .deserialize::<String>()
            .ok()
            .filter(|t| !t.is_empty())
    }

    fn label(&self) -> Option<String> {
        let bus = self.bus();
        let (name, path) = (&self.inner.name, &self.inner.path);
        bus.property_str(name, path, ACCESSIBLE_IFACE, "Name")
            .or_else(|| bus.property_str(name, path, ACCESSIBLE_IFACE, "Description"))
    }

    fn is_clickable(&self) -> bool {
        if !self.implements(ACTION_IFACE) {
            return false;
        }
        let bus = self.bus();
        let (name, path) = (&self.inner.name, &self.inner.path);
        if has_state(&bus.states(name, path), STATE_DEFUNCT) {
            return false;
        }
        bus.property_i32(name, path, ACTION_IFACE, "NActions")
            .map(|n| n > 0)
            .unwrap_or(false)
    }

    fn children(&self) -> Vec<Self> {
        self.bus()
            .children(&self.inner.name, &self.inner.path)
            .into_iter()
            .map(|(name, path)| {
                AtspiNode::new(Arc::clone(&self.inner.bus), name, path, Some(self.clone()))
            })
            .collect()
    }

    fn parent(&self) -> Option<Self> {
        self.inner.parent.clone()
    }

    fn activate(&self) -> bool {
        match self
            .bus()
            .call(&self.inner.name, &self.inner.path, ACTION_IFACE, "DoAction", &(0i32,))
        {
            Ok(reply) => reply.body().deserialize::<bool>().unwrap_or(false),
            Err(e) => {
                warn!("DoAction failed on {}{}: {}", self.inner.name, self.inner.path, e);
                false
            }
        }
    }
}
