// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 区域枚举表
//!
//! 纯静态数据：一级行政区及其下属区县代码。分页API按区县请求，
//! 全量接口按名称在地址中匹配，HTML名录按简称作为搜索关键字。

use serde::{Deserialize, Serialize};

/// 二级区域（区/市/郡）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubRegion {
    pub code: String,
    pub name: String,
}

/// 一级区域
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// 区域代码
    pub code: String,
    /// 正式名称，如“서울특별시”
    pub name: String,
    /// 简称，同时用作搜索关键字，如“서울”
    pub short_name: String,
    /// 旧称，如“강원도”
    #[serde(default)]
    pub aliases: Vec<String>,
    /// 下属区域，按请求顺序排列
    pub sub_regions: Vec<SubRegion>,
}

impl Region {
    /// 搜索关键字
    pub fn keyword(&self) -> &str {
        &self.short_name
    }

    /// 自由文本是否指向本区域
    ///
    /// 正式名称或旧称出现在文本中，或文本以简称开头。简称只做前缀匹配，
    /// 否则“경기도 광주시”会被误判为광주광역시。
    pub fn matches_text(&self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        text.contains(&self.name)
            || text.starts_with(&self.short_name)
            || self.aliases.iter().any(|a| text.contains(a.as_str()))
    }
}

/// 区域表
///
/// 启动时构建一次，之后只读，注入到各数据源适配器中
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegionTable {
    regions: Vec<Region>,
}

type RawProvince = (&'static str, &'static str, &'static str, &'static [(&'static str, &'static str)]);

/// 改制前的正式名称，地址字段中仍大量出现
const LEGACY_NAMES: &[(&str, &str)] = &[
    ("51", "강원도"),
    ("52", "전라북도"),
    ("50", "제주도"),
];

fn aliases_for(code: &str) -> Vec<String> {
    LEGACY_NAMES
        .iter()
        .filter(|(c, _)| *c == code)
        .map(|(_, name)| name.to_string())
        .collect()
}

const PROVINCES: &[RawProvince] = &[
    (
        "11",
        "서울특별시",
        "서울",
        &[
            ("11110", "종로구"),
            ("11140", "중구"),
            ("11170", "용산구"),
            ("11200", "성동구"),
            ("11215", "광진구"),
            ("11230", "동대문구"),
            ("11260", "중랑구"),
            ("11290", "성북구"),
            ("11305", "강북구"),
            ("11320", "도봉구"),
            ("11350", "노원구"),
            ("11380", "은평구"),
            ("11410", "서대문구"),
            ("11440", "마포구"),
            ("11470", "양천구"),
            ("11500", "강서구"),
            ("11530", "구로구"),
            ("11545", "금천구"),
            ("11560", "영등포구"),
            ("11590", "동작구"),
            ("11620", "관악구"),
            ("11650", "서초구"),
            ("11680", "강남구"),
            ("11710", "송파구"),
            ("11740", "강동구"),
        ],
    ),
    (
        "26",
        "부산광역시",
        "부산",
        &[
            ("26110", "중구"),
            ("26140", "서구"),
            ("26170", "동구"),
            ("26200", "영도구"),
            ("26230", "부산진구"),
            ("26260", "동래구"),
            ("26290", "남구"),
            ("26320", "북구"),
            ("26350", "해운대구"),
            ("26380", "사하구"),
            ("26410", "금정구"),
            ("26440", "강서구"),
            ("26470", "연제구"),
            ("26500", "수영구"),
            ("26530", "사상구"),
            ("26710", "기장군"),
        ],
    ),
    (
        "27",
        "대구광역시",
        "대구",
        &[
            ("27110", "중구"),
            ("27140", "동구"),
            ("27170", "서구"),
            ("27200", "남구"),
            ("27230", "북구"),
            ("27260", "수성구"),
            ("27290", "달서구"),
            ("27710", "달성군"),
            ("27720", "군위군"),
        ],
    ),
    (
        "28",
        "인천광역시",
        "인천",
        &[
            ("28110", "중구"),
            ("28140", "동구"),
            ("28177", "미추홀구"),
            ("28185", "연수구"),
            ("28200", "남동구"),
            ("28237", "부평구"),
            ("28245", "계양구"),
            ("28260", "서구"),
            ("28710", "강화군"),
            ("28720", "옹진군"),
        ],
    ),
    (
        "29",
        "광주광역시",
        "광주",
        &[
            ("29110", "동구"),
            ("29140", "서구"),
            ("29155", "남구"),
            ("29170", "북구"),
            ("29200", "광산구"),
        ],
    ),
    (
        "30",
        "대전광역시",
        "대전",
        &[
            ("30110", "동구"),
            ("30140", "중구"),
            ("30170", "서구"),
            ("30200", "유성구"),
            ("30230", "대덕구"),
        ],
    ),
    (
        "31",
        "울산광역시",
        "울산",
        &[
            ("31110", "중구"),
            ("31140", "남구"),
            ("31170", "동구"),
            ("31200", "북구"),
            ("31710", "울주군"),
        ],
    ),
    ("36", "세종특별자치시", "세종", &[("36110", "세종시")]),
    (
        "41",
        "경기도",
        "경기",
        &[
            ("41110", "수원시"),
            ("41130", "성남시"),
            ("41150", "의정부시"),
            ("41170", "안양시"),
            ("41190", "부천시"),
            ("41210", "광명시"),
            ("41220", "평택시"),
            ("41250", "동두천시"),
            ("41270", "안산시"),
            ("41280", "고양시"),
            ("41290", "과천시"),
            ("41310", "구리시"),
            ("41360", "남양주시"),
            ("41370", "오산시"),
            ("41390", "시흥시"),
            ("41410", "군포시"),
            ("41430", "의왕시"),
            ("41450", "하남시"),
            ("41460", "용인시"),
            ("41480", "파주시"),
            ("41500", "이천시"),
            ("41550", "안성시"),
            ("41570", "김포시"),
            ("41590", "화성시"),
            ("41610", "광주시"),
            ("41630", "양주시"),
            ("41650", "포천시"),
            ("41670", "여주시"),
            ("41800", "연천군"),
            ("41820", "가평군"),
            ("41830", "양평군"),
        ],
    ),
    (
        "51",
        "강원특별자치도",
        "강원",
        &[
            ("51110", "춘천시"),
            ("51130", "원주시"),
            ("51150", "강릉시"),
            ("51170", "동해시"),
            ("51190", "태백시"),
            ("51210", "속초시"),
            ("51230", "삼척시"),
            ("51720", "홍천군"),
            ("51730", "횡성군"),
            ("51750", "영월군"),
            ("51760", "평창군"),
            ("51770", "정선군"),
            ("51780", "철원군"),
            ("51790", "화천군"),
            ("51800", "양구군"),
            ("51810", "인제군"),
            ("51820", "고성군"),
            ("51830", "양양군"),
        ],
    ),
    (
        "43",
        "충청북도",
        "충북",
        &[
            ("43110", "청주시"),
            ("43130", "충주시"),
            ("43150", "제천시"),
            ("43720", "보은군"),
            ("43730", "옥천군"),
            ("43740", "영동군"),
            ("43745", "증평군"),
            ("43750", "진천군"),
            ("43760", "괴산군"),
            ("43770", "음성군"),
            ("43800", "단양군"),
        ],
    ),
    (
        "44",
        "충청남도",
        "충남",
        &[
            ("44130", "천안시"),
            ("44150", "공주시"),
            ("44180", "보령시"),
            ("44200", "아산시"),
            ("44210", "서산시"),
            ("44230", "논산시"),
            ("44250", "계룡시"),
            ("44270", "당진시"),
            ("44710", "금산군"),
            ("44760", "부여군"),
            ("44770", "서천군"),
            ("44790", "청양군"),
            ("44800", "홍성군"),
            ("44810", "예산군"),
            ("44825", "태안군"),
        ],
    ),
    (
        "52",
        "전북특별자치도",
        "전북",
        &[
            ("52110", "전주시"),
            ("52130", "군산시"),
            ("52140", "익산시"),
            ("52180", "정읍시"),
            ("52190", "남원시"),
            ("52210", "김제시"),
            ("52710", "완주군"),
            ("52720", "진안군"),
            ("52730", "무주군"),
            ("52740", "장수군"),
            ("52750", "임실군"),
            ("52770", "순창군"),
            ("52790", "고창군"),
            ("52800", "부안군"),
        ],
    ),
    (
        "46",
        "전라남도",
        "전남",
        &[
            ("46110", "목포시"),
            ("46130", "여수시"),
            ("46150", "순천시"),
            ("46170", "나주시"),
            ("46230", "광양시"),
            ("46710", "담양군"),
            ("46720", "곡성군"),
            ("46730", "구례군"),
            ("46770", "고흥군"),
            ("46780", "보성군"),
            ("46790", "화순군"),
            ("46800", "장흥군"),
            ("46810", "강진군"),
            ("46820", "해남군"),
            ("46830", "영암군"),
            ("46840", "무안군"),
            ("46860", "함평군"),
            ("46870", "영광군"),
            ("46880", "장성군"),
            ("46890", "완도군"),
            ("46900", "진도군"),
            ("46910", "신안군"),
        ],
    ),
    (
        "47",
        "경상북도",
        "경북",
        &[
            ("47110", "포항시"),
            ("47130", "경주시"),
            ("47150", "김천시"),
            ("47170", "안동시"),
            ("47190", "구미시"),
            ("47210", "영주시"),
            ("47230", "영천시"),
            ("47250", "상주시"),
            ("47280", "문경시"),
            ("47290", "경산시"),
            ("47730", "의성군"),
            ("47750", "청송군"),
            ("47760", "영양군"),
            ("47770", "영덕군"),
            ("47820", "청도군"),
            ("47830", "고령군"),
            ("47840", "성주군"),
            ("47850", "칠곡군"),
            ("47900", "예천군"),
            ("47920", "봉화군"),
            ("47930", "울진군"),
            ("47940", "울릉군"),
        ],
    ),
    (
        "48",
        "경상남도",
        "경남",
        &[
            ("48120", "창원시"),
            ("48170", "진주시"),
            ("48220", "통영시"),
            ("48240", "사천시"),
            ("48250", "김해시"),
            ("48270", "밀양시"),
            ("48310", "거제시"),
            ("48330", "양산시"),
            ("48720", "의령군"),
            ("48730", "함안군"),
            ("48740", "창녕군"),
            ("48820", "고성군"),
            ("48840", "남해군"),
            ("48850", "하동군"),
            ("48860", "산청군"),
            ("48870", "함양군"),
            ("48880", "거창군"),
            ("48890", "합천군"),
        ],
    ),
    (
        "50",
        "제주특별자치도",
        "제주",
        &[("50110", "제주시"), ("50130", "서귀포시")],
    ),
];

impl RegionTable {
    pub fn new(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    /// 一级行政区及其区县代码，用于按区县分页的API
    pub fn korea_districts() -> Self {
        let regions = PROVINCES
            .iter()
            .map(|(code, name, short, subs)| Region {
                code: code.to_string(),
                name: name.to_string(),
                short_name: short.to_string(),
                aliases: aliases_for(code),
                sub_regions: subs
                    .iter()
                    .map(|(c, n)| SubRegion {
                        code: c.to_string(),
                        name: n.to_string(),
                    })
                    .collect(),
            })
            .collect();
        Self { regions }
    }

    /// 仅一级行政区，不含区县，用于按名称过滤或按关键字搜索的数据源
    pub fn korea_provinces() -> Self {
        let regions = PROVINCES
            .iter()
            .map(|(code, name, short, _)| Region {
                code: code.to_string(),
                name: name.to_string(),
                short_name: short.to_string(),
                aliases: aliases_for(code),
                sub_regions: Vec::new(),
            })
            .collect();
        Self { regions }
    }

    /// 按枚举顺序返回区域列表
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// 返回指定区域的下属区域列表，区域不存在时为空
    pub fn sub_regions(&self, region_code: &str) -> &[SubRegion] {
        self.find(region_code)
            .map(|r| r.sub_regions.as_slice())
            .unwrap_or(&[])
    }

    pub fn find(&self, region_code: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.code == region_code)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
