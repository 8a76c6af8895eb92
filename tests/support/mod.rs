//! In-memory mock adapter: just enough Redis semantics to exercise the
//! execution core without a server.

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use redbatch::{Command, PendingReply, RawConnection, RawError, Reply};

#[derive(Debug, Clone)]
enum Entry {
    Str(Bytes),
    List(Vec<Bytes>),
    Set(Vec<Bytes>),
    Hash(Vec<(Bytes, Bytes)>),
    Zset(Vec<(Bytes, f64)>),
}

/// Reply handle of the mock; carries its outcome eagerly.
pub struct MockPending {
    outcome: Result<Reply, RawError>,
    delay: Option<Duration>,
}

impl PendingReply for MockPending {
    async fn resolve(self) -> Result<Reply, RawError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome
    }
}

/// Scriptable fake connection backed by a hash map.
pub struct MockConnection {
    store: HashMap<Bytes, Entry>,
    in_multi: bool,
    tx_queue: Vec<Command>,
    fail_next: Option<RawError>,
    fail_next_resolve: Option<RawError>,
    resolve_delay: Option<Duration>,
}

impl Default for MockConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConnection {
    pub fn new() -> Self {
        Self {
            store: HashMap::new(),
            in_multi: false,
            tx_queue: Vec::new(),
            fail_next: None,
            fail_next_resolve: None,
            resolve_delay: None,
        }
    }

    /// Fail the next command/enqueue call itself.
    #[allow(dead_code)]
    pub fn fail_next(&mut self, err: RawError) {
        self.fail_next = Some(err);
    }

    /// Make the next enqueued command's pending reply fail on resolve.
    #[allow(dead_code)]
    pub fn fail_next_resolve(&mut self, err: RawError) {
        self.fail_next_resolve = Some(err);
    }

    /// Delay every pending reply's resolution.
    #[allow(dead_code)]
    pub fn delay_replies(&mut self, delay: Duration) {
        self.resolve_delay = Some(delay);
    }

    fn pending(&self, outcome: Result<Reply, RawError>) -> MockPending {
        MockPending {
            outcome,
            delay: self.resolve_delay,
        }
    }

    fn eval(&mut self, cmd: &Command) -> Reply {
        let args = cmd.args();
        match cmd.name() {
            "PING" => Reply::Simple("PONG".into()),
            "ECHO" => Reply::Bulk(args[0].clone()),
            "SET" => {
                self.store.insert(args[0].clone(), Entry::Str(args[1].clone()));
                Reply::Simple("OK".into())
            }
            "GET" => match self.store.get(&args[0]) {
                None => Reply::Nil,
                Some(Entry::Str(v)) => Reply::Bulk(v.clone()),
                Some(_) => wrong_type(),
            },
            "DEL" => {
                let mut removed = 0;
                for key in args {
                    if self.store.remove(key).is_some() {
                        removed += 1;
                    }
                }
                Reply::Int(removed)
            }
            "EXISTS" => Reply::Int(self.store.contains_key(&args[0]) as i64),
            "INCR" => match self.store.get(&args[0]) {
                Some(Entry::Str(v)) => match parse_int(v) {
                    Some(n) => {
                        let next = n + 1;
                        self.store
                            .insert(args[0].clone(), Entry::Str(Bytes::from(next.to_string())));
                        Reply::Int(next)
                    }
                    None => Reply::Error("ERR value is not an integer or out of range".into()),
                },
                Some(_) => wrong_type(),
                None => {
                    self.store
                        .insert(args[0].clone(), Entry::Str(Bytes::from("1")));
                    Reply::Int(1)
                }
            },
            "RPUSH" | "LPUSH" => {
                let push_front = cmd.name() == "LPUSH";
                let entry = self
                    .store
                    .entry(args[0].clone())
                    .or_insert_with(|| Entry::List(Vec::new()));
                match entry {
                    Entry::List(items) => {
                        for value in &args[1..] {
                            if push_front {
                                items.insert(0, value.clone());
                            } else {
                                items.push(value.clone());
                            }
                        }
                        Reply::Int(items.len() as i64)
                    }
                    _ => wrong_type(),
                }
            }
            "LRANGE" => match self.store.get(&args[0]) {
                None => Reply::Array(Vec::new()),
                Some(Entry::List(items)) => {
                    let (start, stop) = match (parse_int(&args[1]), parse_int(&args[2])) {
                        (Some(a), Some(b)) => (a, b),
                        _ => return Reply::Error("ERR value is not an integer".into()),
                    };
                    let range = slice_range(items.len(), start, stop);
                    Reply::Array(
                        items[range]
                            .iter()
                            .map(|v| Reply::Bulk(v.clone()))
                            .collect(),
                    )
                }
                Some(_) => wrong_type(),
            },
            "LPOP" => match self.store.get_mut(&args[0]) {
                Some(Entry::List(items)) if !items.is_empty() => Reply::Bulk(items.remove(0)),
                Some(Entry::List(_)) | None => Reply::Nil,
                Some(_) => wrong_type(),
            },
            // Blocking pop against an empty source: the timeout elapses and
            // the absence is the reply, not an error.
            "BLPOP" => match self.store.get_mut(&args[0]) {
                Some(Entry::List(items)) if !items.is_empty() => {
                    let value = items.remove(0);
                    Reply::Array(vec![Reply::Bulk(args[0].clone()), Reply::Bulk(value)])
                }
                Some(Entry::List(_)) | None => Reply::Nil,
                Some(_) => wrong_type(),
            },
            "SADD" => {
                let entry = self
                    .store
                    .entry(args[0].clone())
                    .or_insert_with(|| Entry::Set(Vec::new()));
                match entry {
                    Entry::Set(members) => {
                        let mut added = 0;
                        for member in &args[1..] {
                            if !members.contains(member) {
                                members.push(member.clone());
                                added += 1;
                            }
                        }
                        Reply::Int(added)
                    }
                    _ => wrong_type(),
                }
            }
            "SMEMBERS" => match self.store.get(&args[0]) {
                None => Reply::Array(Vec::new()),
                Some(Entry::Set(members)) => Reply::Array(
                    members.iter().map(|m| Reply::Bulk(m.clone())).collect(),
                ),
                Some(_) => wrong_type(),
            },
            "HSET" => {
                let entry = self
                    .store
                    .entry(args[0].clone())
                    .or_insert_with(|| Entry::Hash(Vec::new()));
                match entry {
                    Entry::Hash(fields) => {
                        let mut added = 0;
                        for pair in args[1..].chunks(2) {
                            match fields.iter_mut().find(|(f, _)| *f == pair[0]) {
                                Some((_, v)) => *v = pair[1].clone(),
                                None => {
                                    fields.push((pair[0].clone(), pair[1].clone()));
                                    added += 1;
                                }
                            }
                        }
                        Reply::Int(added)
                    }
                    _ => wrong_type(),
                }
            }
            "HGETALL" => match self.store.get(&args[0]) {
                None => Reply::Array(Vec::new()),
                Some(Entry::Hash(fields)) => Reply::Array(
                    fields
                        .iter()
                        .flat_map(|(f, v)| [Reply::Bulk(f.clone()), Reply::Bulk(v.clone())])
                        .collect(),
                ),
                Some(_) => wrong_type(),
            },
            "ZADD" => {
                let entry = self
                    .store
                    .entry(args[0].clone())
                    .or_insert_with(|| Entry::Zset(Vec::new()));
                match entry {
                    Entry::Zset(members) => {
                        let mut added = 0;
                        for pair in args[1..].chunks(2) {
                            let score = match parse_float(&pair[0]) {
                                Some(s) => s,
                                None => {
                                    return Reply::Error("ERR value is not a valid float".into());
                                }
                            };
                            match members.iter_mut().find(|(m, _)| *m == pair[1]) {
                                Some((_, s)) => *s = score,
                                None => {
                                    members.push((pair[1].clone(), score));
                                    added += 1;
                                }
                            }
                        }
                        members.sort_by(|a, b| a.1.total_cmp(&b.1));
                        Reply::Int(added)
                    }
                    _ => wrong_type(),
                }
            }
            "ZRANGE" => match self.store.get(&args[0]) {
                None => Reply::Array(Vec::new()),
                Some(Entry::Zset(members)) => {
                    let (start, stop) = match (parse_int(&args[1]), parse_int(&args[2])) {
                        (Some(a), Some(b)) => (a, b),
                        _ => return Reply::Error("ERR value is not an integer".into()),
                    };
                    let with_scores = args
                        .get(3)
                        .map(|a| a.eq_ignore_ascii_case(b"WITHSCORES"))
                        .unwrap_or(false);
                    let range = slice_range(members.len(), start, stop);
                    let mut items = Vec::new();
                    for (member, score) in &members[range] {
                        items.push(Reply::Bulk(member.clone()));
                        if with_scores {
                            items.push(Reply::Bulk(Bytes::from(format_score(*score))));
                        }
                    }
                    Reply::Array(items)
                }
                Some(_) => wrong_type(),
            },
            other => Reply::Error(format!("ERR unknown command '{other}'")),
        }
    }
}

impl RawConnection for MockConnection {
    type Pending = MockPending;

    async fn command(&mut self, cmd: &Command) -> Result<Reply, RawError> {
        if let Some(err) = self.fail_next.take() {
            return Err(err);
        }
        Ok(self.eval(cmd))
    }

    async fn enqueue(&mut self, cmd: &Command) -> Result<Self::Pending, RawError> {
        if let Some(err) = self.fail_next.take() {
            return Err(err);
        }
        if let Some(err) = self.fail_next_resolve.take() {
            return Ok(self.pending(Err(err)));
        }
        if self.in_multi {
            self.tx_queue.push(cmd.clone());
            return Ok(self.pending(Ok(Reply::Simple("QUEUED".into()))));
        }
        let reply = self.eval(cmd);
        Ok(self.pending(Ok(reply)))
    }

    async fn begin(&mut self) -> Result<(), RawError> {
        self.in_multi = true;
        self.tx_queue.clear();
        Ok(())
    }

    async fn abort(&mut self) -> Result<(), RawError> {
        self.in_multi = false;
        self.tx_queue.clear();
        Ok(())
    }

    async fn commit(&mut self) -> Result<Self::Pending, RawError> {
        self.in_multi = false;
        let queued: Vec<Command> = self.tx_queue.drain(..).collect();
        let replies: Vec<Reply> = queued.iter().map(|cmd| self.eval(cmd)).collect();
        Ok(self.pending(Ok(Reply::Array(replies))))
    }

    async fn open_batch(&mut self) -> Result<(), RawError> {
        Ok(())
    }

    async fn sync(&mut self) -> Result<(), RawError> {
        Ok(())
    }
}

fn wrong_type() -> Reply {
    Reply::Error("WRONGTYPE Operation against a key holding the wrong kind of value".into())
}

fn parse_int(bytes: &Bytes) -> Option<i64> {
    std::str::from_utf8(bytes).ok()?.parse().ok()
}

fn parse_float(bytes: &Bytes) -> Option<f64> {
    std::str::from_utf8(bytes).ok()?.parse().ok()
}

fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{}", score as i64)
    } else {
        format!("{score}")
    }
}

fn slice_range(len: usize, start: i64, stop: i64) -> std::ops::Range<usize> {
    let len = len as i64;
    let clamp = |i: i64| -> i64 {
        let i = if i < 0 { len + i } else { i };
        i.clamp(0, len)
    };
    let start = clamp(start) as usize;
    let stop = if stop < 0 {
        (len + stop + 1).clamp(0, len) as usize
    } else {
        (stop + 1).min(len) as usize
    };
    start..stop.max(start)
}
