//! 페이지 텍스트 diff
//!
//! 문자(유니코드 스칼라) 단위 Myers diff를 구한 뒤, 사람이 읽을 수 있는 단위로 묶는
//! 시맨틱 정리(semantic cleanup)를 거칩니다.
//!
//! 1. 공통 접두사/접미사를 떼어내고, 가운데를 middle snake 이분법으로 재귀 분할
//! 2. 병합(merge): 인접한 같은 연산을 합치고 삽입/삭제 쌍의 공통 부분을 밖으로 빼냄
//! 3. 시맨틱 정리: 양쪽 편집보다 짧은 동등 구간을 편집으로 흡수하고,
//!    단일 편집을 단어/줄 경계 쪽으로 밀고, 삭제/삽입이 겹치는 부분을 동등 구간으로 추출
//!
//! 최소 편집 스크립트는 아니지만, 바뀐 단어 하나가 삽입/삭제 한 쌍으로 나옵니다.

use crate::models::{DiffOp, DiffSegment, PageText, TextDiff};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Chunk {
    op: DiffOp,
    text: Vec<char>,
}

impl Chunk {
    fn new(op: DiffOp, text: &[char]) -> Self {
        Self {
            op,
            text: text.to_vec(),
        }
    }
}

/// 두 스냅샷의 페이지별 diff.
///
/// 페이지 인덱스 `0..max(base.len(), compare.len())`마다 `pageIndex`로 텍스트를 찾고,
/// 한쪽에 없는 페이지는 빈 문자열로 취급합니다 (페이지 전체가 삽입/삭제된 것으로 보임).
pub fn compute_text_diff(base: &[PageText], compare: &[PageText]) -> Vec<TextDiff> {
    let page_count = base.len().max(compare.len());
    (0..page_count)
        .map(|page_index| {
            diff_page(
                page_index,
                page_text(base, page_index),
                page_text(compare, page_index),
            )
        })
        .collect()
}

fn page_text(pages: &[PageText], page_index: usize) -> &str {
    pages
        .iter()
        .find(|p| p.page_index == page_index)
        .map_or("", |p| p.text.as_str())
}

pub fn diff_page(page_index: usize, base: &str, compare: &str) -> TextDiff {
    let segments = diff_text(base, compare);

    let mut added_char_count = 0;
    let mut removed_char_count = 0;
    for segment in &segments {
        match segment.op {
            DiffOp::Insert => added_char_count += segment.text.chars().count(),
            DiffOp::Delete => removed_char_count += segment.text.chars().count(),
            DiffOp::Equal => {}
        }
    }

    TextDiff {
        page_index,
        has_changes: segments.iter().any(|s| s.op != DiffOp::Equal),
        segments,
        added_char_count,
        removed_char_count,
    }
}

/// 시맨틱 정리까지 마친 문자 단위 diff. 빈 구간은 포함하지 않습니다.
pub fn diff_text(base: &str, compare: &str) -> Vec<DiffSegment> {
    let a: Vec<char> = base.chars().collect();
    let b: Vec<char> = compare.chars().collect();

    let mut chunks = diff_main(&a, &b);
    cleanup_semantic(&mut chunks);

    // 정리 단계가 비운 구간을 빼고, 그 바람에 이웃하게 된 같은 연산을 합칩니다.
    let mut segments: Vec<DiffSegment> = Vec::with_capacity(chunks.len());
    for chunk in chunks.into_iter().filter(|c| !c.text.is_empty()) {
        let text: String = chunk.text.into_iter().collect();
        match segments.last_mut() {
            Some(last) if last.op == chunk.op => last.text.push_str(&text),
            _ => segments.push(DiffSegment { op: chunk.op, text }),
        }
    }
    segments
}

fn diff_main(a: &[char], b: &[char]) -> Vec<Chunk> {
    if a == b {
        return if a.is_empty() {
            Vec::new()
        } else {
            vec![Chunk::new(DiffOp::Equal, a)]
        };
    }

    let prefix = common_prefix(a, b);
    let (a_rest, b_rest) = (&a[prefix..], &b[prefix..]);
    let suffix = common_suffix(a_rest, b_rest);
    let a_mid = &a_rest[..a_rest.len() - suffix];
    let b_mid = &b_rest[..b_rest.len() - suffix];

    let mut chunks = Vec::new();
    if prefix > 0 {
        chunks.push(Chunk::new(DiffOp::Equal, &a[..prefix]));
    }
    chunks.extend(compute(a_mid, b_mid));
    if suffix > 0 {
        chunks.push(Chunk::new(DiffOp::Equal, &a_rest[a_rest.len() - suffix..]));
    }

    cleanup_merge(&mut chunks);
    chunks
}

/// 공통 접두사/접미사가 없는 두 텍스트의 diff
fn compute(a: &[char], b: &[char]) -> Vec<Chunk> {
    if a.is_empty() {
        return vec![Chunk::new(DiffOp::Insert, b)];
    }
    if b.is_empty() {
        return vec![Chunk::new(DiffOp::Delete, a)];
    }

    let (long, short, op) = if a.len() > b.len() {
        (a, b, DiffOp::Delete)
    } else {
        (b, a, DiffOp::Insert)
    };

    // 짧은 쪽이 긴 쪽 안에 통째로 들어있는 경우
    if let Some(i) = long.windows(short.len()).position(|w| w == short) {
        return vec![
            Chunk::new(op, &long[..i]),
            Chunk::new(DiffOp::Equal, short),
            Chunk::new(op, &long[i + short.len()..]),
        ];
    }

    if short.len() == 1 {
        return vec![Chunk::new(DiffOp::Delete, a), Chunk::new(DiffOp::Insert, b)];
    }

    bisect(a, b)
}

/// Myers의 middle snake를 찾아 그 지점에서 문제를 둘로 나눕니다.
fn bisect(a: &[char], b: &[char]) -> Vec<Chunk> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    let max_d = (n + m + 1) / 2;
    let v_offset = max_d;
    let v_length = 2 * max_d;
    let mut v1 = vec![-1isize; v_length as usize];
    let mut v2 = vec![-1isize; v_length as usize];
    v1[(v_offset + 1) as usize] = 0;
    v2[(v_offset + 1) as usize] = 0;

    let delta = n - m;
    // 두 길이의 차가 홀수면 정방향 경로가 역방향 경로와 만나는 쪽입니다.
    let front = delta % 2 != 0;

    let (mut k1_start, mut k1_end, mut k2_start, mut k2_end) = (0isize, 0isize, 0isize, 0isize);

    for d in 0..max_d {
        let mut k1 = -d + k1_start;
        while k1 <= d - k1_end {
            let k1_offset = (v_offset + k1) as usize;
            let mut x1 = if k1 == -d || (k1 != d && v1[k1_offset - 1] < v1[k1_offset + 1]) {
                v1[k1_offset + 1]
            } else {
                v1[k1_offset - 1] + 1
            };
            let mut y1 = x1 - k1;
            while x1 < n && y1 < m && a[x1 as usize] == b[y1 as usize] {
                x1 += 1;
                y1 += 1;
            }
            v1[k1_offset] = x1;

            if x1 > n {
                k1_end += 2;
            } else if y1 > m {
                k1_start += 2;
            } else if front {
                let k2_offset = v_offset + delta - k1;
                if k2_offset >= 0 && k2_offset < v_length && v2[k2_offset as usize] != -1 {
                    let x2 = n - v2[k2_offset as usize];
                    if x1 >= x2 {
                        return bisect_split(a, b, x1 as usize, y1 as usize);
                    }
                }
            }
            k1 += 2;
        }

        let mut k2 = -d + k2_start;
        while k2 <= d - k2_end {
            let k2_offset = (v_offset + k2) as usize;
            let mut x2 = if k2 == -d || (k2 != d && v2[k2_offset - 1] < v2[k2_offset + 1]) {
                v2[k2_offset + 1]
            } else {
                v2[k2_offset - 1] + 1
            };
            let mut y2 = x2 - k2;
            while x2 < n && y2 < m && a[(n - x2 - 1) as usize] == b[(m - y2 - 1) as usize] {
                x2 += 1;
                y2 += 1;
            }
            v2[k2_offset] = x2;

            if x2 > n {
                k2_end += 2;
            } else if y2 > m {
                k2_start += 2;
            } else if !front {
                let k1_offset = v_offset + delta - k2;
                if k1_offset >= 0 && k1_offset < v_length && v1[k1_offset as usize] != -1 {
                    let x1 = v1[k1_offset as usize];
                    let y1 = v_offset + x1 - k1_offset;
                    if x1 >= n - x2 {
                        return bisect_split(a, b, x1 as usize, y1 as usize);
                    }
                }
            }
            k2 += 2;
        }
    }

    // 공통 부분이 전혀 없음
    vec![Chunk::new(DiffOp::Delete, a), Chunk::new(DiffOp::Insert, b)]
}

fn bisect_split(a: &[char], b: &[char], x: usize, y: usize) -> Vec<Chunk> {
    let mut chunks = diff_main(&a[..x], &b[..y]);
    chunks.extend(diff_main(&a[x..], &b[y..]));
    chunks
}

fn common_prefix(a: &[char], b: &[char]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn common_suffix(a: &[char], b: &[char]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

/// `a`의 접미사이면서 `b`의 접두사인 가장 긴 구간의 길이
fn common_overlap(a: &[char], b: &[char]) -> usize {
    let max = a.len().min(b.len());
    (1..=max)
        .rev()
        .find(|&len| a[a.len() - len..] == b[..len])
        .unwrap_or(0)
}

fn concat(first: &[char], second: &[char]) -> Vec<char> {
    let mut joined = Vec::with_capacity(first.len() + second.len());
    joined.extend_from_slice(first);
    joined.extend_from_slice(second);
    joined
}

/// 인접한 같은 연산을 합치고, 삽입/삭제 묶음의 공통 접두사/접미사를 동등 구간으로 빼냅니다.
/// 그 다음 양옆이 동등 구간인 단일 편집을 한쪽으로 밀어 동등 구간 하나를 없앨 수 있으면 밉니다.
fn cleanup_merge(chunks: &mut Vec<Chunk>) {
    // 마지막 묶음을 처리하기 위한 빈 동등 구간
    chunks.push(Chunk::new(DiffOp::Equal, &[]));

    let mut pointer = 0;
    let mut count_delete = 0;
    let mut count_insert = 0;
    let mut text_delete: Vec<char> = Vec::new();
    let mut text_insert: Vec<char> = Vec::new();

    while pointer < chunks.len() {
        match chunks[pointer].op {
            DiffOp::Insert => {
                count_insert += 1;
                text_insert.extend_from_slice(&chunks[pointer].text);
                pointer += 1;
            }
            DiffOp::Delete => {
                count_delete += 1;
                text_delete.extend_from_slice(&chunks[pointer].text);
                pointer += 1;
            }
            DiffOp::Equal => {
                if count_delete + count_insert > 1 {
                    if count_delete != 0 && count_insert != 0 {
                        let prefix = common_prefix(&text_insert, &text_delete);
                        if prefix != 0 {
                            let start = pointer - count_delete - count_insert;
                            if start > 0 && chunks[start - 1].op == DiffOp::Equal {
                                chunks[start - 1].text.extend_from_slice(&text_insert[..prefix]);
                            } else {
                                chunks.insert(0, Chunk::new(DiffOp::Equal, &text_insert[..prefix]));
                                pointer += 1;
                            }
                            text_insert.drain(..prefix);
                            text_delete.drain(..prefix);
                        }

                        let suffix = common_suffix(&text_insert, &text_delete);
                        if suffix != 0 {
                            let tail = &text_insert[text_insert.len() - suffix..];
                            chunks[pointer].text = concat(tail, &chunks[pointer].text);
                            text_insert.truncate(text_insert.len() - suffix);
                            text_delete.truncate(text_delete.len() - suffix);
                        }
                    }

                    let start = pointer - count_delete - count_insert;
                    chunks.drain(start..pointer);
                    pointer = start;
                    if !text_delete.is_empty() {
                        chunks.insert(pointer, Chunk::new(DiffOp::Delete, &text_delete));
                        pointer += 1;
                    }
                    if !text_insert.is_empty() {
                        chunks.insert(pointer, Chunk::new(DiffOp::Insert, &text_insert));
                        pointer += 1;
                    }
                    pointer += 1;
                } else if pointer != 0 && chunks[pointer - 1].op == DiffOp::Equal {
                    let text = std::mem::take(&mut chunks[pointer].text);
                    chunks[pointer - 1].text.extend(text);
                    chunks.remove(pointer);
                } else {
                    pointer += 1;
                }
                count_insert = 0;
                count_delete = 0;
                text_delete.clear();
                text_insert.clear();
            }
        }
    }
    if chunks.last().is_some_and(|c| c.text.is_empty()) {
        chunks.pop();
    }

    // 예: A<ins>BA</ins>C -> <ins>AB</ins>AC
    let mut changes = false;
    let mut pointer = 1;
    while pointer + 1 < chunks.len() {
        if chunks[pointer - 1].op == DiffOp::Equal && chunks[pointer + 1].op == DiffOp::Equal {
            let prev = chunks[pointer - 1].text.clone();
            let next = chunks[pointer + 1].text.clone();
            let edit = chunks[pointer].text.clone();

            if edit.ends_with(&prev) {
                chunks[pointer].text = concat(&prev, &edit[..edit.len() - prev.len()]);
                chunks[pointer + 1].text = concat(&prev, &next);
                chunks.remove(pointer - 1);
                changes = true;
            } else if edit.starts_with(&next) {
                chunks[pointer - 1].text.extend_from_slice(&next);
                chunks[pointer].text = concat(&edit[next.len()..], &next);
                chunks.remove(pointer + 1);
                changes = true;
            }
        }
        pointer += 1;
    }
    if changes {
        cleanup_merge(chunks);
    }
}

/// 양쪽 편집량보다 길지 않은 동등 구간을 삭제+삽입으로 흡수합니다.
fn cleanup_semantic(chunks: &mut Vec<Chunk>) {
    let mut changes = false;
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<Vec<char>> = None;
    let mut pointer: isize = 0;
    // 마지막 동등 구간 앞(1)과 뒤(2)의 삽입/삭제 문자 수
    let (mut inserted_before, mut deleted_before) = (0usize, 0usize);
    let (mut inserted_after, mut deleted_after) = (0usize, 0usize);

    while (pointer as usize) < chunks.len() {
        let p = pointer as usize;
        if chunks[p].op == DiffOp::Equal {
            equalities.push(p);
            inserted_before = inserted_after;
            deleted_before = deleted_after;
            inserted_after = 0;
            deleted_after = 0;
            last_equality = Some(chunks[p].text.clone());
        } else {
            if chunks[p].op == DiffOp::Insert {
                inserted_after += chunks[p].text.len();
            } else {
                deleted_after += chunks[p].text.len();
            }

            if let (Some(equality), Some(&at)) = (last_equality.clone(), equalities.last()) {
                if equality.len() <= inserted_before.max(deleted_before)
                    && equality.len() <= inserted_after.max(deleted_after)
                {
                    chunks.insert(at, Chunk::new(DiffOp::Delete, &equality));
                    chunks[at + 1].op = DiffOp::Insert;
                    // 방금 지운 동등 구간과, 다시 평가해야 할 그 앞의 동등 구간을 버립니다.
                    equalities.pop();
                    equalities.pop();
                    pointer = equalities.last().map_or(-1, |&i| i as isize);
                    inserted_before = 0;
                    deleted_before = 0;
                    inserted_after = 0;
                    deleted_after = 0;
                    last_equality = None;
                    changes = true;
                }
            }
        }
        pointer += 1;
    }

    if changes {
        cleanup_merge(chunks);
    }
    cleanup_semantic_lossless(chunks);

    // 삭제와 삽입이 겹치면 겹친 부분을 동등 구간으로 빼냅니다.
    // 예: <del>abcxxx</del><ins>xxxdef</ins> -> <del>abc</del>xxx<ins>def</ins>
    let mut pointer = 1;
    while pointer < chunks.len() {
        if chunks[pointer - 1].op == DiffOp::Delete && chunks[pointer].op == DiffOp::Insert {
            let deletion = chunks[pointer - 1].text.clone();
            let insertion = chunks[pointer].text.clone();
            let overlap1 = common_overlap(&deletion, &insertion);
            let overlap2 = common_overlap(&insertion, &deletion);

            if overlap1 >= overlap2 {
                if overlap1 * 2 >= deletion.len() || overlap1 * 2 >= insertion.len() {
                    chunks.insert(pointer, Chunk::new(DiffOp::Equal, &insertion[..overlap1]));
                    chunks[pointer - 1].text = deletion[..deletion.len() - overlap1].to_vec();
                    chunks[pointer + 1].text = insertion[overlap1..].to_vec();
                    pointer += 1;
                }
            } else if overlap2 * 2 >= deletion.len() || overlap2 * 2 >= insertion.len() {
                chunks.insert(pointer, Chunk::new(DiffOp::Equal, &deletion[..overlap2]));
                chunks[pointer - 1] = Chunk::new(DiffOp::Insert, &insertion[..insertion.len() - overlap2]);
                chunks[pointer + 1] = Chunk::new(DiffOp::Delete, &deletion[overlap2..]);
                pointer += 1;
            }
            pointer += 1;
        }
        pointer += 1;
    }
}

/// 양옆이 동등 구간인 단일 편집을 의미 경계(빈 줄, 줄바꿈, 문장 끝, 공백)에 맞춰 밉니다.
/// 예: The c<ins>at c</ins>ame. -> The <ins>cat </ins>came.
fn cleanup_semantic_lossless(chunks: &mut Vec<Chunk>) {
    let mut pointer: isize = 1;
    while pointer >= 1 && (pointer as usize) + 1 < chunks.len() {
        let p = pointer as usize;
        if chunks[p - 1].op == DiffOp::Equal && chunks[p + 1].op == DiffOp::Equal {
            let mut equality1 = chunks[p - 1].text.clone();
            let mut edit = chunks[p].text.clone();
            let mut equality2 = chunks[p + 1].text.clone();

            // 먼저 편집을 왼쪽 끝까지 민다
            let offset = common_suffix(&equality1, &edit);
            if offset > 0 {
                let common = edit[edit.len() - offset..].to_vec();
                equality1.truncate(equality1.len() - offset);
                edit = concat(&common, &edit[..edit.len() - offset]);
                equality2 = concat(&common, &equality2);
            }

            // 한 글자씩 오른쪽으로 옮기며 가장 점수가 높은 위치를 찾는다
            let mut best = (equality1.clone(), edit.clone(), equality2.clone());
            let mut best_score =
                semantic_score(&equality1, &edit) + semantic_score(&edit, &equality2);
            while !edit.is_empty() && !equality2.is_empty() && edit[0] == equality2[0] {
                let moved = edit.remove(0);
                equality1.push(moved);
                edit.push(equality2.remove(0));
                let score = semantic_score(&equality1, &edit) + semantic_score(&edit, &equality2);
                // >= 이라 같은 점수면 오른쪽 위치를 택합니다.
                if score >= best_score {
                    best_score = score;
                    best = (equality1.clone(), edit.clone(), equality2.clone());
                }
            }

            if chunks[p - 1].text != best.0 {
                let (best_equality1, best_edit, best_equality2) = best;
                let mut p = p;
                if best_equality1.is_empty() {
                    chunks.remove(p - 1);
                    p -= 1;
                    pointer -= 1;
                } else {
                    chunks[p - 1].text = best_equality1;
                }
                chunks[p].text = best_edit;
                if best_equality2.is_empty() {
                    chunks.remove(p + 1);
                    pointer -= 1;
                } else {
                    chunks[p + 1].text = best_equality2;
                }
            }
        }
        pointer += 1;
    }
}

/// 두 구간 사이 경계가 얼마나 자연스러운지 (0..=6, 클수록 좋음)
fn semantic_score(one: &[char], two: &[char]) -> u8 {
    let (Some(&c1), Some(&c2)) = (one.last(), two.first()) else {
        // 텍스트 끝은 가장 좋은 경계
        return 6;
    };

    let non_alnum1 = !c1.is_alphanumeric();
    let non_alnum2 = !c2.is_alphanumeric();
    let whitespace1 = non_alnum1 && c1.is_whitespace();
    let whitespace2 = non_alnum2 && c2.is_whitespace();
    let line_break1 = whitespace1 && matches!(c1, '\n' | '\r');
    let line_break2 = whitespace2 && matches!(c2, '\n' | '\r');
    let blank_line1 = line_break1 && ends_with_blank_line(one);
    let blank_line2 = line_break2 && starts_with_blank_line(two);

    if blank_line1 || blank_line2 {
        5
    } else if line_break1 || line_break2 {
        4
    } else if non_alnum1 && !whitespace1 && whitespace2 {
        // 문장 끝
        3
    } else if whitespace1 || whitespace2 {
        2
    } else if non_alnum1 || non_alnum2 {
        1
    } else {
        0
    }
}

fn ends_with_blank_line(text: &[char]) -> bool {
    text.ends_with(&['\n', '\n']) || text.ends_with(&['\n', '\r', '\n'])
}

fn starts_with_blank_line(text: &[char]) -> bool {
    fn skip_cr(t: &[char]) -> &[char] {
        match t.first() {
            Some('\r') => &t[1..],
            _ => t,
        }
    }
    let rest = skip_cr(text);
    match rest.first() {
        Some('\n') => skip_cr(&rest[1..]).first() == Some(&'\n'),
        _ => false,
    }
}
